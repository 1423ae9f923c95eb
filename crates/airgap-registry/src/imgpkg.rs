use crate::{CancelToken, RegistryClient, RegistryError};
use airgap_schema::{ImageRef, RepoPath};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

/// Marker imgpkg prints when `-i` is used on a bundle image.
const BUNDLE_HINT: &str = "Use -b instead of -i";

/// Registry client backed by the `imgpkg` command-line tool.
///
/// Each operation maps onto one imgpkg invocation:
/// - `copy -i <src> --to-tar <archive>` (retried with `-b` for bundles)
/// - `copy --tar <archive> --to-repo <dest>`
/// - `pull -i <src> -o <dir>`
/// - `tag list -i <repo> --json`
///
/// The subprocess is polled while it runs and killed as soon as the
/// [`CancelToken`] trips.
pub struct ImgpkgClient {
    program: String,
    leading_args: Vec<String>,
    poll_interval: Duration,
}

impl Default for ImgpkgClient {
    fn default() -> Self {
        Self::new("imgpkg")
    }
}

impl ImgpkgClient {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_owned(),
            leading_args: Vec::new(),
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Build a client from a command line such as `["imgpkg"]` or
    /// `["docker", "run", "--rm", "imgpkg-image"]`.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, rest) = command.split_first()?;
        let mut client = Self::new(program);
        client.leading_args = rest.to_vec();
        Some(client)
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[String], cancel: &CancelToken) -> Result<Vec<u8>, RegistryError> {
        cancel.check()?;
        let cmdline = std::iter::once(&self.program)
            .chain(&self.leading_args)
            .chain(args)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        debug!("running {cmdline}");

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RegistryError::ToolNotFound(self.program.clone())
                } else {
                    RegistryError::Io(e)
                }
            })?;

        // Drain both pipes on their own threads so a chatty child never blocks
        // on a full pipe while we poll.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Err(interrupted) = cancel.check() {
                debug!("killing {cmdline}: {interrupted}");
                let _ = child.kill();
                let _ = child.wait();
                return Err(interrupted.into());
            }
            std::thread::sleep(self.poll_interval);
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);
        if !status.success() {
            // A terminal SIGINT reaches imgpkg too, so it can exit before the
            // next poll sees the token.
            cancel.check()?;
            return Err(RegistryError::CommandFailed {
                command: cmdline,
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_owned(),
            });
        }
        Ok(stdout)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Extract tag names from `imgpkg tag list --json` output.
///
/// The output is a go-cli-ui document: `{"Tables": [{"Rows": [{"name": ...}]}]}`.
fn parse_tag_list(output: &[u8]) -> Result<Vec<String>, RegistryError> {
    let doc: serde_json::Value = serde_json::from_slice(output)
        .map_err(|e| RegistryError::Serialization(format!("tag list: {e}")))?;
    let tables = doc
        .get("Tables")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| RegistryError::Serialization("tag list: missing Tables".to_owned()))?;

    let mut tags = Vec::new();
    for table in tables {
        let Some(rows) = table.get("Rows").and_then(serde_json::Value::as_array) else {
            continue;
        };
        for row in rows {
            let name = row
                .get("name")
                .or_else(|| row.get("tag"))
                .and_then(serde_json::Value::as_str);
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                tags.push(name.to_owned());
            }
        }
    }
    Ok(tags)
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl RegistryClient for ImgpkgClient {
    fn name(&self) -> &'static str {
        "imgpkg"
    }

    fn copy_image_to_archive(
        &self,
        source: &ImageRef,
        archive: &Path,
        concurrency: usize,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError> {
        let source = source.to_string();
        let args = |flag: &str| {
            vec![
                "copy".to_owned(),
                flag.to_owned(),
                source.clone(),
                "--to-tar".to_owned(),
                lossy(archive),
                "--concurrency".to_owned(),
                concurrency.to_string(),
                "--resume".to_owned(),
            ]
        };
        match self.run(&args("-i"), cancel) {
            Err(RegistryError::CommandFailed { stderr, .. }) if stderr.contains(BUNDLE_HINT) => {
                info!("{source} is a bundle, copying with -b");
                self.run(&args("-b"), cancel)?;
            }
            other => {
                other?;
            }
        }
        Ok(())
    }

    fn copy_archive_to_registry(
        &self,
        archive: &Path,
        destination: &RepoPath,
        ca_cert: Option<&Path>,
        concurrency: usize,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError> {
        let mut args = vec![
            "copy".to_owned(),
            "--tar".to_owned(),
            lossy(archive),
            "--to-repo".to_owned(),
            destination.to_string(),
            "--concurrency".to_owned(),
            concurrency.to_string(),
        ];
        if let Some(cert) = ca_cert {
            args.push("--registry-ca-cert-path".to_owned());
            args.push(lossy(cert));
        }
        self.run(&args, cancel)?;
        Ok(())
    }

    fn pull_to_directory(
        &self,
        source: &ImageRef,
        dir: &Path,
        cancel: &CancelToken,
    ) -> Result<(), RegistryError> {
        let args = vec![
            "pull".to_owned(),
            "-i".to_owned(),
            source.to_string(),
            "-o".to_owned(),
            lossy(dir),
        ];
        self.run(&args, cancel)?;
        Ok(())
    }

    fn list_tags(
        &self,
        repository: &RepoPath,
        cancel: &CancelToken,
    ) -> Result<Vec<String>, RegistryError> {
        let args = vec![
            "tag".to_owned(),
            "list".to_owned(),
            "-i".to_owned(),
            repository.to_string(),
            "--json".to_owned(),
        ];
        let output = self.run(&args, cancel)?;
        parse_tag_list(&output)
    }
}
