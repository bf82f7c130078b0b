use crate::error::{GcontribError, Result};
use crate::git::blame::{parse_line_porcelain, BlameLine};
use gix::traverse::tree::Recorder;
use gix::{discover, ObjectId, Repository};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

/// A blob in the tree of the blamed revision.
#[derive(Debug, Clone)]
pub struct TrackedFile {
    pub path: String,
    pub id: ObjectId,
}

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        debug!(path = %path.display(), "opened repository");

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name: the work tree directory name.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }

    pub fn head_revision(&self) -> Result<String> {
        let id = self
            .repo
            .head_id()
            .map_err(|e| GcontribError::GitRepo(format!("Cannot resolve HEAD: {e}")))?;
        Ok(id.detach().to_string())
    }

    /// Regular files in the tree of `revision`, without submodules and symlinks,
    /// sorted by path. Staged but uncommitted files are not listed.
    pub fn tracked_files(&self, revision: &str) -> Result<Vec<TrackedFile>> {
        let id = ObjectId::from_hex(revision.as_bytes())
            .map_err(|e| GcontribError::GitRepo(format!("Invalid revision '{revision}': {e}")))?;
        let tree = self
            .repo
            .find_commit(id)
            .map_err(|e| GcontribError::GitRepo(format!("Cannot find commit {revision}: {e}")))?
            .tree()
            .map_err(|e| GcontribError::GitRepo(format!("Cannot read tree of {revision}: {e}")))?;

        let mut recorder = Recorder::default();
        tree.traverse()
            .breadthfirst(&mut recorder)
            .map_err(|e| GcontribError::GitRepo(format!("Cannot walk tree of {revision}: {e}")))?;

        let mut files: Vec<TrackedFile> = recorder
            .records
            .into_iter()
            .filter(|e| e.mode.is_blob())
            .map(|e| TrackedFile {
                path: e.filepath.to_string(),
                id: e.oid,
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = files.len(), revision, "listed tracked files");
        Ok(files)
    }

    pub fn is_binary(&self, id: ObjectId) -> Result<bool> {
        let object = self.repo.find_object(id)?;
        Ok(is_binary_object(&object))
    }

    /// Blame `path` at `revision`, one entry per line.
    pub fn blame(&self, path: &str, revision: &str) -> Result<Vec<BlameLine>> {
        trace!(path, revision, "running git blame");
        let output = Command::new("git")
            .args(["blame", "--line-porcelain", "-w", revision, "--", path])
            .current_dir(&self.path)
            .output()?;

        if !output.status.success() {
            return Err(GcontribError::Blame {
                path: path.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_line_porcelain(&String::from_utf8_lossy(&output.stdout))
    }
}

fn is_binary_object(object: &gix::Object) -> bool {
    object.data.as_slice().iter().take(8192).any(|&b| b == 0)
}
