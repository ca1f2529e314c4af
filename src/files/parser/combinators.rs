// Copyright (c) 2016-2021 Fabian Schuiki

//! The processes of the composite rules: sequences, choices, and repetitions.

use crate::lexer::token::Token;
use crate::parser::rule::{Process, Rule};
use crate::parser::result::{Build, BuildError, Mismatch, MismatchKind, Node, ParseResult};
use log::trace;
use poc_common::source::SourcePosition;

/// Turn the nodes collected by a composite rule into its result.
///
/// Without a builder, no node yields a plain match and a single node is passed
/// through. More than one node requires a builder.
fn conclude(
    rule: &Rule,
    build: Option<Build>,
    nodes: Vec<Node>,
    last: bool,
    start: SourcePosition,
    token: &Token,
) -> ParseResult {
    let node = match build {
        Some(build) => match build(nodes) {
            Ok(node) => node,
            Err(BuildError::Reject(reason)) => {
                return ParseResult::Mismatch(Mismatch::new(reason, start));
            }
            Err(BuildError::Internal(reason)) => {
                return ParseResult::Mismatch(Mismatch::internal(
                    format!("cannot build {}: {}", rule.name, reason),
                    token.start,
                ));
            }
        },
        None if nodes.len() > 1 => {
            return ParseResult::Mismatch(Mismatch::internal(
                format!("{} collected {} nodes but has no builder", rule.name, nodes.len()),
                token.start,
            ));
        }
        None => match nodes.into_iter().next() {
            Some(node) => node,
            None if last => return ParseResult::LastMatch,
            None => return ParseResult::Match,
        },
    };
    ParseResult::Collected { node, last }
}

/// Runs the rules of a sequence one after another.
pub struct SequenceProcess<'g> {
    rule: &'g Rule<'g>,
    rules: &'g [&'g Rule<'g>],
    build: Option<Build>,
    index: usize,
    current: Box<dyn Process + 'g>,
    nodes: Vec<Node>,
    start: Option<SourcePosition>,
}

impl<'g> SequenceProcess<'g> {
    pub fn new(
        rule: &'g Rule<'g>,
        rules: &'g [&'g Rule<'g>],
        build: Option<Build>,
    ) -> SequenceProcess<'g> {
        SequenceProcess {
            rule,
            rules,
            build,
            index: 0,
            current: rules[0].start(),
            nodes: Vec::new(),
            start: None,
        }
    }
}

impl Process for SequenceProcess<'_> {
    fn feed(&mut self, token: &Token) -> Option<ParseResult> {
        let start = *self.start.get_or_insert(token.start);
        loop {
            let result = self.current.feed(token)?;
            if let ParseResult::Mismatch(_) = result {
                return Some(result);
            }
            let last = result.consumed();
            if let Some(node) = result.into_node() {
                self.nodes.push(node);
            }
            self.index += 1;
            if self.index == self.rules.len() {
                let nodes = std::mem::take(&mut self.nodes);
                return Some(conclude(self.rule, self.build, nodes, last, start, token));
            }
            self.current = self.rules[self.index].start();
            if last {
                return None;
            }
        }
    }
}

/// Runs the alternatives of a choice in lock-step.
pub struct ChoiceProcess<'g> {
    rule: &'g Rule<'g>,
    alternatives: Vec<(&'g Rule<'g>, Box<dyn Process + 'g>)>,
    /// The number of tokens fed so far.
    steps: usize,
    deepest: Option<(usize, Mismatch)>,
}

impl<'g> ChoiceProcess<'g> {
    pub fn new(rule: &'g Rule<'g>, rules: &'g [&'g Rule<'g>]) -> ChoiceProcess<'g> {
        ChoiceProcess {
            rule,
            alternatives: rules.iter().map(|r| (*r, r.start())).collect(),
            steps: 0,
            deepest: None,
        }
    }

    /// Keep the mismatch of the alternative that survived the longest, and
    /// among those the one furthest into the input. Among equally deep ones,
    /// the earliest alternative wins.
    fn record(&mut self, mismatch: Mismatch) {
        let depth = (self.steps, mismatch.position.absolute);
        let deeper = match self.deepest {
            Some((steps, ref d)) => depth > (steps, d.position.absolute),
            None => true,
        };
        if deeper {
            self.deepest = Some((self.steps, mismatch));
        }
    }
}

impl Process for ChoiceProcess<'_> {
    fn feed(&mut self, token: &Token) -> Option<ParseResult> {
        self.steps += 1;
        let mut matched = Vec::new();
        let mut live = Vec::with_capacity(self.alternatives.len());
        for (rule, mut process) in std::mem::take(&mut self.alternatives) {
            match process.feed(token) {
                None => live.push((rule, process)),
                Some(ParseResult::Mismatch(m)) => {
                    if m.kind != MismatchKind::Grammar {
                        return Some(ParseResult::Mismatch(m));
                    }
                    trace!("{}: pruned {} at {}: {}", self.rule.name, rule.name, m.position, m.reason);
                    self.record(m);
                }
                Some(result) => matched.push((rule, result)),
            }
        }
        self.alternatives = live;

        if matched.len() > 1 {
            let names: Vec<_> = matched.iter().map(|(r, _)| r.name.as_str()).collect();
            return Some(ParseResult::Mismatch(Mismatch::ambiguous(
                format!(
                    "ambiguous alternatives for {}: {} all match",
                    self.rule.name,
                    names.join(", ")
                ),
                token.start,
            )));
        }
        if let Some((rule, result)) = matched.pop() {
            trace!("{}: chose {} at {}", self.rule.name, rule.name, token.start);
            return Some(result);
        }
        if self.alternatives.is_empty() {
            let mismatch = match self.deepest.take() {
                Some((_, m)) => m,
                None => self.rule.expected(token),
            };
            return Some(ParseResult::Mismatch(mismatch));
        }
        None
    }
}

/// Runs a rule repeatedly, restarting it after every match.
pub struct RepeatProcess<'g> {
    rule: &'g Rule<'g>,
    inner: &'g Rule<'g>,
    min: usize,
    max: usize,
    build: Option<Build>,
    current: Box<dyn Process + 'g>,
    /// The number of tokens fed to the current instance.
    fed: usize,
    count: usize,
    nodes: Vec<Node>,
    start: Option<SourcePosition>,
}

impl<'g> RepeatProcess<'g> {
    pub fn new(
        rule: &'g Rule<'g>,
        inner: &'g Rule<'g>,
        min: usize,
        max: usize,
        build: Option<Build>,
    ) -> RepeatProcess<'g> {
        RepeatProcess {
            rule,
            inner,
            min,
            max,
            build,
            current: inner.start(),
            fed: 0,
            count: 0,
            nodes: Vec::new(),
            start: None,
        }
    }
}

impl Process for RepeatProcess<'_> {
    fn feed(&mut self, token: &Token) -> Option<ParseResult> {
        let start = *self.start.get_or_insert(token.start);
        loop {
            self.fed += 1;
            let result = self.current.feed(token)?;
            match result {
                ParseResult::Mismatch(m) => {
                    // A fresh instance that rejects its very first token ends
                    // the repetition before that token.
                    if self.fed > 1 || m.kind != MismatchKind::Grammar {
                        return Some(ParseResult::Mismatch(m));
                    }
                    if self.count < self.min {
                        return Some(ParseResult::Mismatch(m));
                    }
                    trace!("{}: done after {} matches", self.rule.name, self.count);
                    let nodes = std::mem::take(&mut self.nodes);
                    return Some(conclude(self.rule, self.build, nodes, false, start, token));
                }
                result => {
                    let last = result.consumed();
                    if !last && self.fed == 1 {
                        return Some(ParseResult::Mismatch(Mismatch::internal(
                            format!("{} matched empty input inside {}", self.inner.name, self.rule.name),
                            token.start,
                        )));
                    }
                    if let Some(node) = result.into_node() {
                        self.nodes.push(node);
                    }
                    self.count += 1;
                    if self.max != 0 && self.count > self.max {
                        return Some(ParseResult::Mismatch(Mismatch::new(
                            format!("expected at most {} {}", self.max, self.inner.name),
                            token.start,
                        )));
                    }
                    self.current = self.inner.start();
                    self.fed = 0;
                    if last {
                        return None;
                    }
                }
            }
        }
    }
}
