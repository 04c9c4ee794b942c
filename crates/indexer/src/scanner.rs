use codechat_code_chunker::Language;
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MiB

/// A C/C++ source to index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Name stored with the file's chunks, see [`source_name`]
    pub source: String,
}

impl ScannedFile {
    /// `path` named relative to an already canonical `anchor`
    pub fn named_against(anchor: &Path, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            source: source_name(anchor, &path),
            path,
        }
    }
}

/// Canonical form of `path`, or `path` itself when it cannot be resolved
pub(crate) fn canonical_or_self(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// `/`-separated name of `path` relative to the canonical `anchor`.
///
/// `path` is canonicalized first, so `./src/a.c`, `src/../src/a.c` and an absolute
/// path to the same file all get one name. Files outside `anchor` keep their
/// canonical absolute path.
pub fn source_name(anchor: &Path, path: &Path) -> String {
    let canonical = canonical_or_self(path);
    let relative = canonical.strip_prefix(anchor).unwrap_or(&canonical);
    let name = relative.to_string_lossy();
    if name.contains('\\') {
        name.replace('\\', "/")
    } else {
        name.into_owned()
    }
}

/// Scanner for C/C++ sources in a project (.gitignore aware)
pub struct FileScanner {
    root: PathBuf,
    anchor: PathBuf,
    max_file_bytes: u64,
}

impl FileScanner {
    /// Scan `root`, naming files relative to it
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            anchor: canonical_or_self(&root),
            root,
            max_file_bytes: MAX_FILE_SIZE_BYTES,
        }
    }

    /// Name files relative to `anchor` (typically the project root) instead of the
    /// scan root
    #[must_use]
    pub fn source_root(mut self, anchor: impl AsRef<Path>) -> Self {
        self.anchor = canonical_or_self(anchor.as_ref());
        self
    }

    #[must_use]
    pub fn max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sources under the root, sorted by relative path
    pub fn scan(&self) -> Vec<ScannedFile> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false);
        builder.filter_entry(move |entry| !Self::is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if Language::from_path(path).is_none() {
                        continue;
                    }

                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > self.max_file_bytes {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                self.max_file_bytes
                            );
                            continue;
                        }
                    }

                    files.push(ScannedFile::named_against(&self.anchor, path));
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort_by(|a, b| a.source.cmp(&b.source));
        log::info!(
            "Found {} C/C++ source files under {}",
            files.len(),
            self.root.display()
        );
        files
    }

    fn is_ignored_scope(path: &Path, root: &Path) -> bool {
        if let Ok(relative) = path.strip_prefix(root) {
            for component in relative.components() {
                if let Component::Normal(name) = component {
                    let lowered = name.to_string_lossy().to_lowercase();
                    if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".cache",
    ".codechat",
    // build trees
    "build",
    "cmake-build-debug",
    "cmake-build-release",
    "out",
    "bin",
    "obj",
    "target",
    "cmakefiles",
    // vendored code
    "vendor",
    "third_party",
    "third-party",
    "external",
    "node_modules",
];
