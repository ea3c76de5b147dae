//! Per-account file storage for Arquivista.
//!
//! Files live in category folders under each account's root:
//! ```text
//! {upload_root}/
//! ├── 1/
//! │   ├── imagens/png/photo.PNG
//! │   └── documentos/pdf/report.pdf
//! └── 2/
//!     └── compactados/backup.zip
//! ```
//! Category folders come only from the extension table, never from
//! user input.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::category::Classifier;
use super::guard::{resolve_strictly_within_root, resolve_within_root};
use super::sanitize::secure_filename;
use crate::config::FilesConfig;
use crate::logging::SECURITY_TARGET;
use crate::{ArquivistaError, Result};

/// Listing bucket for files sitting directly in an account root.
///
/// Uploads never put files there; the bucket only shows files placed by
/// other means so they can still be deleted.
pub const ROOT_CATEGORY: &str = "(sem categoria)";

/// Separator used between path segments in category display names.
pub const CATEGORY_SEPARATOR: &str = " / ";

/// One file submitted for upload.
#[derive(Debug, Clone)]
pub struct UploadEntry {
    /// Filename as sent by the client (may be empty for an empty input field).
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadEntry {
    /// Create an upload entry.
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Outcome of an upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Number of files written.
    pub accepted: usize,
    /// Original names of entries refused for their type.
    pub rejected: Vec<String>,
    /// Relative paths (usable for deletion) of the files written.
    pub saved: Vec<String>,
    /// Entries that passed the type check but could not be written.
    pub failed: Vec<UploadFailure>,
}

/// An allowed file whose write failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    /// Original name as sent by the client.
    pub filename: String,
    /// Underlying error message.
    pub message: String,
}

/// A stored file as shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFileEntry {
    /// File name.
    pub name: String,
    /// Path relative to the account root, '/'-separated.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

/// Category display name to the files directly inside that folder.
pub type Listing = BTreeMap<String, Vec<StoredFileEntry>>;

/// Totals over an account's files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of files.
    pub files: usize,
    /// Sum of file sizes in bytes.
    pub bytes: u64,
}

impl StorageStats {
    /// Compute totals for a listing.
    pub fn from_listing(listing: &Listing) -> Self {
        listing.values().flatten().fold(Self::default(), |acc, f| Self {
            files: acc.files + 1,
            bytes: acc.bytes + f.size,
        })
    }
}

/// Result of a delete request that passed the path check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file was removed.
    Deleted,
    /// Nothing existed at that path.
    NotFound,
}

/// File store shared by all accounts.
#[derive(Debug, Clone)]
pub struct FileStore {
    upload_root: PathBuf,
    classifier: Classifier,
}

impl FileStore {
    /// Create a store rooted at `upload_root`.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(upload_root: impl Into<PathBuf>, classifier: Classifier) -> Result<Self> {
        let upload_root = upload_root.into();
        fs::create_dir_all(&upload_root)?;

        Ok(Self {
            upload_root,
            classifier,
        })
    }

    /// Create a store from the files configuration.
    pub fn from_config(config: &FilesConfig) -> Result<Self> {
        Self::new(&config.upload_root, Classifier::from_config(config))
    }

    /// Directory holding every account root.
    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    /// The extension classifier.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Operations scoped to one account.
    ///
    /// The account id is the only input to the root path.
    pub fn for_account(&self, account_id: i64) -> AccountFiles<'_> {
        AccountFiles {
            account_id,
            root: self.upload_root.join(account_id.to_string()),
            classifier: &self.classifier,
        }
    }
}

/// File operations confined to a single account root.
#[derive(Debug)]
pub struct AccountFiles<'a> {
    account_id: i64,
    root: PathBuf,
    classifier: &'a Classifier,
}

impl AccountFiles<'_> {
    /// The account root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every non-empty folder under the account root.
    ///
    /// Folders without files are left out; a missing or empty root yields
    /// an empty listing. Files are sorted by name.
    pub fn list_files(&self) -> Result<Listing> {
        let mut listing = Listing::new();
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(listing),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(listing),
            Err(e) => return Err(e.into()),
        }

        self.walk(&self.root, &mut listing)?;
        for files in listing.values_mut() {
            files.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(listing)
    }

    fn walk(&self, dir: &Path, listing: &mut Listing) -> Result<()> {
        let mut files = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() {
                self.walk(&path, listing)?;
            } else if file_type.is_file() {
                files.push(StoredFileEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path: self.relative_path(&path),
                    size: entry.metadata()?.len(),
                });
            }
        }

        if !files.is_empty() {
            listing.insert(self.category_name(dir), files);
        }
        Ok(())
    }

    /// '/'-separated path of `path` relative to the account root.
    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn category_name(&self, dir: &Path) -> String {
        let relative = self.relative_path(dir);
        if relative.is_empty() {
            ROOT_CATEGORY.to_string()
        } else {
            relative.replace('/', CATEGORY_SEPARATOR)
        }
    }

    /// Totals over the account's files.
    pub fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats::from_listing(&self.list_files()?))
    }

    /// Sort a batch of files into their category folders.
    ///
    /// A batch larger than `limit` is refused as a whole before anything is
    /// written. Entries with an empty filename are skipped; entries with a
    /// missing or disallowed extension are reported in `rejected`. Existing
    /// files with the same name are overwritten. A write failure is recorded
    /// in `failed` and the rest of the batch is still processed, so `saved`
    /// always names what is on disk.
    pub fn upload(&self, entries: &[UploadEntry], limit: usize) -> Result<UploadReport> {
        if entries.len() > limit {
            warn!(
                account_id = self.account_id,
                count = entries.len(),
                limit,
                "Upload refused: too many files"
            );
            return Err(ArquivistaError::BatchTooLarge {
                count: entries.len(),
                limit,
            });
        }

        if entries.iter().all(|e| e.filename.is_empty()) {
            return Err(ArquivistaError::EmptySelection);
        }

        let mut report = UploadReport::default();

        for entry in entries {
            if entry.filename.is_empty() {
                continue;
            }

            let name = secure_filename(&entry.filename)
                .filter(|_| self.classifier.is_allowed(&entry.filename))
                .filter(|name| self.classifier.is_allowed(name));
            let Some(name) = name else {
                warn!(
                    account_id = self.account_id,
                    filename = %entry.filename,
                    "Upload of disallowed file type refused"
                );
                report.rejected.push(entry.filename.clone());
                continue;
            };

            let category = self.classifier.classify(&name);
            match self.write_entry(category, &name, &entry.content) {
                Ok(destination) => {
                    info!(
                        account_id = self.account_id,
                        filename = %name,
                        destination = %destination.display(),
                        "File saved"
                    );
                    report.accepted += 1;
                    report.saved.push(format!("{category}/{name}"));
                }
                Err(e) => {
                    error!(
                        account_id = self.account_id,
                        filename = %name,
                        category,
                        error = %e,
                        "Failed to save file"
                    );
                    report.failed.push(UploadFailure {
                        filename: entry.filename.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    fn write_entry(&self, category: &str, name: &str, content: &[u8]) -> Result<PathBuf> {
        let destination = resolve_within_root(&self.root, category)?;
        fs::create_dir_all(&destination)?;
        fs::write(destination.join(name), content)?;
        Ok(destination)
    }

    /// Delete the file at `relative_path` under the account root.
    ///
    /// Paths resolving to the root itself or outside it are refused with
    /// [`ArquivistaError::PathTraversal`] before the filesystem is touched.
    /// A missing file is [`DeleteOutcome::NotFound`]; any other failure is
    /// returned with its message.
    pub fn delete(&self, relative_path: &str) -> Result<DeleteOutcome> {
        let target = match resolve_strictly_within_root(&self.root, relative_path) {
            Ok(target) => target,
            Err(e) => {
                error!(
                    target: SECURITY_TARGET,
                    account_id = self.account_id,
                    path = %relative_path,
                    "Blocked delete outside the account root"
                );
                return Err(e);
            }
        };

        match fs::remove_file(&target) {
            Ok(()) => {
                info!(
                    account_id = self.account_id,
                    path = %target.display(),
                    "File deleted"
                );
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    account_id = self.account_id,
                    path = %target.display(),
                    "Delete of missing file"
                );
                Ok(DeleteOutcome::NotFound)
            }
            Err(e) => {
                error!(
                    account_id = self.account_id,
                    path = %target.display(),
                    error = %e,
                    "Failed to delete file"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, FileStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("uploads"), Classifier::default()).unwrap();
        (temp_dir, store)
    }

    fn entry(name: &str) -> UploadEntry {
        UploadEntry::new(name, format!("content of {name}").into_bytes())
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("uploads");
        assert!(!root.exists());

        let store = FileStore::new(&root, Classifier::default()).unwrap();

        assert!(root.is_dir());
        assert_eq!(store.upload_root(), root);
    }

    #[test]
    fn test_account_root() {
        let (_temp_dir, store) = setup_store();
        assert_eq!(store.for_account(42).root(), store.upload_root().join("42"));
    }

    #[test]
    fn test_upload_scenario() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);

        let report = files
            .upload(&[entry("photo.PNG"), entry("report.pdf")], 40)
            .unwrap();

        assert_eq!(report.accepted, 2);
        assert!(report.rejected.is_empty());
        assert_eq!(
            report.saved,
            vec!["imagens/png/photo.PNG", "documentos/pdf/report.pdf"]
        );
        assert!(files.root().join("imagens/png/photo.PNG").is_file());
        assert!(files.root().join("documentos/pdf/report.pdf").is_file());

        let listing = files.list_files().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing["imagens / png"].len(), 1);
        assert_eq!(listing["imagens / png"][0].name, "photo.PNG");
        assert_eq!(listing["imagens / png"][0].path, "imagens/png/photo.PNG");
        assert_eq!(listing["documentos / pdf"][0].path, "documentos/pdf/report.pdf");
    }

    #[test]
    fn test_upload_write_failure_keeps_partial_report() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);

        // A plain file where the "documentos" folder should be
        fs::create_dir_all(files.root()).unwrap();
        fs::write(files.root().join("documentos"), "not a folder").unwrap();

        let report = files
            .upload(
                &[entry("photo.png"), entry("report.pdf"), entry("song.mp3")],
                40,
            )
            .unwrap();

        assert_eq!(report.accepted, 2);
        assert_eq!(
            report.saved,
            vec!["imagens/png/photo.png", "multimedia/audio/song.mp3"]
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].filename, "report.pdf");
        assert!(!report.failed[0].message.is_empty());
        assert!(files.root().join("imagens/png/photo.png").is_file());
        assert!(files.root().join("multimedia/audio/song.mp3").is_file());
    }

    #[test]
    fn test_upload_batch_too_large_writes_nothing() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);
        let batch: Vec<_> = (0..5).map(|i| entry(&format!("f{i}.txt"))).collect();

        let result = files.upload(&batch, 4);

        assert!(matches!(
            result,
            Err(ArquivistaError::BatchTooLarge { count: 5, limit: 4 })
        ));
        assert!(!files.root().exists());
        assert!(files.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_upload_at_limit_accepts_all() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);
        let batch: Vec<_> = (0..4).map(|i| entry(&format!("f{i}.txt"))).collect();

        let report = files.upload(&batch, 4).unwrap();

        assert_eq!(report.accepted, batch.len());
        assert_eq!(files.stats().unwrap().files, 4);
    }

    #[test]
    fn test_upload_rejects_disallowed_and_missing_extensions() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);

        let report = files
            .upload(
                &[entry("virus.exe"), entry("Makefile"), entry("ok.zip"), entry(".png")],
                40,
            )
            .unwrap();

        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, vec!["virus.exe", "Makefile", ".png"]);
        let listing = files.list_files().unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing.contains_key("compactados"));
    }

    #[test]
    fn test_upload_skips_empty_filenames() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);

        let report = files
            .upload(&[entry(""), entry("notes.txt"), entry("")], 40)
            .unwrap();

        assert_eq!(report.accepted, 1);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_upload_empty_selection() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);

        assert!(matches!(
            files.upload(&[], 40),
            Err(ArquivistaError::EmptySelection)
        ));
        assert!(matches!(
            files.upload(&[entry("")], 40),
            Err(ArquivistaError::EmptySelection)
        ));
    }

    #[test]
    fn test_upload_sanitizes_names() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);

        let report = files
            .upload(&[entry("../../escape/relatório final.pdf")], 40)
            .unwrap();

        assert_eq!(report.saved, vec!["documentos/pdf/relatorio_final.pdf"]);
        assert!(files.root().join("documentos/pdf/relatorio_final.pdf").is_file());
        assert!(!store.upload_root().join("escape").exists());
    }

    #[test]
    fn test_upload_overwrites_same_name() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);

        files
            .upload(&[UploadEntry::new("a.txt", b"first".to_vec())], 40)
            .unwrap();
        files
            .upload(&[UploadEntry::new("a.txt", b"second".to_vec())], 40)
            .unwrap();

        let content = fs::read(files.root().join("documentos/texto/a.txt")).unwrap();
        assert_eq!(content, b"second");
        assert_eq!(files.stats().unwrap().files, 1);
    }

    #[test]
    fn test_upload_with_custom_table() {
        let temp_dir = TempDir::new().unwrap();
        let classifier = Classifier::new(
            [("csv".to_string(), "planilhas/csv".to_string())].into(),
            "outros",
        );
        let store = FileStore::new(temp_dir.path(), classifier).unwrap();

        let report = store
            .for_account(3)
            .upload(&[entry("DATA.CSV"), entry("photo.png")], 40)
            .unwrap();

        assert_eq!(report.saved, vec!["planilhas/csv/DATA.CSV"]);
        assert_eq!(report.rejected, vec!["photo.png"]);
    }

    #[test]
    fn test_list_empty_and_missing_root() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(9);

        assert!(files.list_files().unwrap().is_empty());

        fs::create_dir_all(files.root().join("imagens/png")).unwrap();
        assert!(files.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_list_root_level_files() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);
        fs::create_dir_all(files.root()).unwrap();
        fs::write(files.root().join("loose.txt"), b"x").unwrap();

        let listing = files.list_files().unwrap();

        assert_eq!(listing.len(), 1);
        let loose = &listing[ROOT_CATEGORY];
        assert_eq!(loose[0].path, "loose.txt");
        assert_eq!(files.delete(&loose[0].path).unwrap(), DeleteOutcome::Deleted);
    }

    #[test]
    fn test_list_sorted_with_sizes() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);
        files
            .upload(
                &[
                    UploadEntry::new("b.txt", b"bb".to_vec()),
                    UploadEntry::new("a.txt", b"a".to_vec()),
                ],
                40,
            )
            .unwrap();

        let listing = files.list_files().unwrap();
        let texts = &listing["documentos / texto"];

        assert_eq!(texts[0].name, "a.txt");
        assert_eq!(texts[1].name, "b.txt");
        assert_eq!(texts[1].size, 2);
        assert_eq!(
            files.stats().unwrap(),
            StorageStats { files: 2, bytes: 3 }
        );
    }

    #[test]
    fn test_accounts_are_isolated() {
        let (_temp_dir, store) = setup_store();
        store.for_account(1).upload(&[entry("mine.txt")], 40).unwrap();

        assert!(store.for_account(2).list_files().unwrap().is_empty());
        assert_eq!(
            store.for_account(2).delete("documentos/texto/mine.txt").unwrap(),
            DeleteOutcome::NotFound
        );
        assert!(matches!(
            store.for_account(2).delete("../1/documentos/texto/mine.txt"),
            Err(ArquivistaError::PathTraversal(_))
        ));
        assert_eq!(store.for_account(1).stats().unwrap().files, 1);
    }

    #[test]
    fn test_delete_removes_only_target() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);
        files
            .upload(&[entry("a.txt"), entry("b.txt")], 40)
            .unwrap();

        let outcome = files.delete("documentos/texto/a.txt").unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(!files.root().join("documentos/texto/a.txt").exists());
        assert!(files.root().join("documentos/texto/b.txt").exists());
    }

    #[test]
    fn test_delete_missing_file() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);
        files.upload(&[entry("keep.txt")], 40).unwrap();

        let outcome = files.delete("documentos/texto/ghost.txt").unwrap();

        assert_eq!(outcome, DeleteOutcome::NotFound);
        assert_eq!(files.stats().unwrap().files, 1);
    }

    #[test]
    fn test_delete_traversal_touches_nothing() {
        let (temp_dir, store) = setup_store();
        let outside = temp_dir.path().join("outside.txt");
        fs::write(&outside, b"precious").unwrap();
        let files = store.for_account(1);

        for attack in ["../../outside.txt", "../", "", ".", "/etc/passwd"] {
            assert!(
                matches!(files.delete(attack), Err(ArquivistaError::PathTraversal(_))),
                "{attack:?} should be refused"
            );
        }
        assert!(outside.exists());
    }

    #[test]
    fn test_delete_directory_reports_error() {
        let (_temp_dir, store) = setup_store();
        let files = store.for_account(1);
        files.upload(&[entry("a.txt")], 40).unwrap();

        let result = files.delete("documentos/texto");

        assert!(matches!(result, Err(ArquivistaError::Io(_))));
        assert!(files.root().join("documentos/texto/a.txt").exists());
    }
}
