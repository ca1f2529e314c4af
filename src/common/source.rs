// Copyright (c) 2016-2021 Fabian Schuiki

//! A global source file table that assigns an opaque ID to each processed
//! file list. This keeps source locations lean and allows diagnostics to look
//! up the offending line when they are printed.

use memmap2::Mmap;
use serde::Serialize;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const INVALID_SOURCE: Source = Source(0);

/// An opaque handle to a source file registered with the `SourceManager`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Source(pub u32);

impl Source {
    /// Return the path of this source file.
    pub fn get_path(self) -> Rc<str> {
        get_source_manager().with(self, |x| x.get_path())
    }

    /// Access the contents of this source file.
    pub fn get_content(self) -> Rc<dyn SourceContent> {
        get_source_manager().with(self, |x| x.get_content())
    }

    /// Check whether this handle refers to an actual file.
    pub fn is_valid(self) -> bool {
        self.0 > 0 && get_source_manager().contains(self)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Source({}; \"{}\")", self.0, self.get_path())
        } else {
            write!(f, "Source(INVALID)")
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_valid() {
            fmt::Display::fmt(&self.get_path(), f)
        } else {
            write!(f, "<invalid>")
        }
    }
}

pub trait SourceFile {
    fn get_id(&self) -> Source;
    fn get_path(&self) -> Rc<str>;

    /// Obtain the content of this source file.
    fn get_content(&self) -> Rc<dyn SourceContent>;
}

pub trait SourceContent {
    /// Obtain the text of the file. Invalid UTF-8 sequences are replaced with
    /// the replacement character.
    fn text(&self) -> Cow<str>;

    /// Obtain the raw bytes of the file.
    fn bytes(&self) -> &[u8];

    /// Copy the given 1-based line out of the file, without its line
    /// terminator. Returns `None` if the file has fewer lines.
    fn line(&self, row: usize) -> Option<String> {
        if row == 0 {
            return None;
        }
        let text = self.text();
        let line = text.split('\n').nth(row - 1)?;
        Some(line.trim_end_matches('\r').to_string())
    }
}

/// A manager for source files and their assigned IDs.
pub struct SourceManager {
    map: RefCell<HashMap<PathBuf, Source>>,
    vect: RefCell<Vec<Box<dyn SourceFile>>>,
}

impl SourceManager {
    fn new() -> SourceManager {
        SourceManager {
            map: RefCell::new(HashMap::new()),
            vect: RefCell::new(Vec::new()),
        }
    }

    /// Obtain the source file for a given source ID.
    ///
    /// Panics if the ID was not handed out by this manager.
    pub fn with<F, R>(&self, id: Source, f: F) -> R
    where
        F: FnOnce(&dyn SourceFile) -> R,
    {
        let vect = self.vect.borrow();
        assert!(id.0 > 0, "invalid source");
        assert!(
            (id.0 as usize - 1) < vect.len(),
            "unknown source file: Source({}) >= {}",
            id.0,
            vect.len()
        );
        f(&*vect[id.0 as usize - 1])
    }

    /// Check whether the given ID was handed out by this manager.
    pub fn contains(&self, id: Source) -> bool {
        id.0 > 0 && (id.0 as usize) <= self.vect.borrow().len()
    }

    /// Look up a file that has already been opened or added.
    pub fn find<P: AsRef<Path>>(&self, filename: P) -> Option<Source> {
        self.map.borrow().get(filename.as_ref()).cloned()
    }

    /// Open a file on disk and map it into memory. Opening the same path
    /// twice yields the same handle. Returns `None` if the file does not exist
    /// or cannot be mapped.
    pub fn open<P: AsRef<Path>>(&self, filename: P) -> Option<Source> {
        let filename = filename.as_ref();
        if let Some(id) = self.find(filename) {
            return Some(id);
        }

        let content = match DiskSourceContent::map(filename) {
            Ok(c) => c,
            Err(e) => {
                log::debug!("cannot open `{}`: {}", filename.display(), e);
                return None;
            }
        };
        let mut vect = self.vect.borrow_mut();
        let new_id = Source(vect.len() as u32 + 1);
        self.map
            .borrow_mut()
            .insert(filename.to_path_buf(), new_id);
        vect.push(Box::new(DiskSourceFile {
            id: new_id,
            filename: filename.to_string_lossy().into(),
            content: Rc::new(content),
        }));
        Some(new_id)
    }

    /// Create a virtual file from the contents of a string and add it to the
    /// source manager. Future calls to `open()` with the given filename will
    /// yield the provided contents.
    ///
    /// Panics if a file with that name already exists.
    pub fn add(&self, filename: &str, content: &str) -> Source {
        let mut map = self.map.borrow_mut();
        assert!(
            !map.contains_key(Path::new(filename)),
            "add failed: source \"{}\" already exists",
            filename
        );
        let mut vect = self.vect.borrow_mut();
        let new_id = Source(vect.len() as u32 + 1);
        map.insert(PathBuf::from(filename), new_id);
        vect.push(Box::new(VirtualSourceFile {
            id: new_id,
            filename: filename.into(),
            content: Rc::new(VirtualSourceContent(content.to_string())),
        }));
        new_id
    }

    /// Create a virtual file from the contents of a string. The file can only
    /// be used through the returned `Source`, since there is no name by which
    /// it could be referred to.
    pub fn add_anonymous<S>(&self, content: S) -> Source
    where
        S: Into<String>,
    {
        let mut vect = self.vect.borrow_mut();
        let new_id = Source(vect.len() as u32 + 1);
        vect.push(Box::new(VirtualSourceFile {
            id: new_id,
            filename: "<anonymous>".into(),
            content: Rc::new(VirtualSourceContent(content.into())),
        }));
        new_id
    }
}

/// Get the global source manager.
pub fn get_source_manager() -> Rc<SourceManager> {
    thread_local!(static MNGR: Rc<SourceManager> = {
        Rc::new(SourceManager::new())
    });
    MNGR.with(|x| x.clone())
}

/// A virtual source file that has no correspondence in the file system. Useful
/// for unit tests.
struct VirtualSourceFile {
    id: Source,
    filename: Rc<str>,
    content: Rc<VirtualSourceContent>,
}

struct VirtualSourceContent(String);

impl SourceFile for VirtualSourceFile {
    fn get_id(&self) -> Source {
        self.id
    }

    fn get_path(&self) -> Rc<str> {
        self.filename.clone()
    }

    fn get_content(&self) -> Rc<dyn SourceContent> {
        self.content.clone()
    }
}

impl SourceContent for VirtualSourceContent {
    fn text(&self) -> Cow<str> {
        Cow::Borrowed(&self.0)
    }

    fn bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// A source file on disk.
struct DiskSourceFile {
    id: Source,
    filename: Rc<str>,
    content: Rc<DiskSourceContent>,
}

/// The memory-mapped contents of a file. Empty files cannot be mapped and are
/// represented without a mapping.
struct DiskSourceContent(Option<Mmap>);

impl DiskSourceContent {
    fn map(path: &Path) -> std::io::Result<DiskSourceContent> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(DiskSourceContent(None));
        }
        // The file list is only read; concurrent modification by another
        // process is outside of our control.
        let map = unsafe { Mmap::map(&file)? };
        Ok(DiskSourceContent(Some(map)))
    }
}

impl SourceFile for DiskSourceFile {
    fn get_id(&self) -> Source {
        self.id
    }

    fn get_path(&self) -> Rc<str> {
        self.filename.clone()
    }

    fn get_content(&self) -> Rc<dyn SourceContent> {
        self.content.clone()
    }
}

impl SourceContent for DiskSourceContent {
    fn text(&self) -> Cow<str> {
        String::from_utf8_lossy(self.bytes())
    }

    fn bytes(&self) -> &[u8] {
        match self.0 {
            Some(ref map) => &map[..],
            None => &[],
        }
    }
}

/// A position within a file list, as stamped onto tokens by the tokenizer.
///
/// All three coordinates are 1-based: the first character of a document sits
/// at row 1, column 1, absolute offset 1. The absolute offset counts
/// characters, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourcePosition {
    pub row: usize,
    pub column: usize,
    pub absolute: usize,
}

impl SourcePosition {
    pub fn new(row: usize, column: usize, absolute: usize) -> SourcePosition {
        SourcePosition {
            row,
            column,
            absolute,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// A position within a specific source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub source: Source,
    pub position: SourcePosition,
}

impl Location {
    pub fn new(source: Source, position: SourcePosition) -> Location {
        Location { source, position }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.position)
    }
}
