//! Isolated build home
//!
//! Generation runs sbt against a throwaway home so the resulting Coursier
//! cache contains exactly what the configured runs resolved. The home is
//! passed explicitly to everything that touches it.

use crate::error::{SquishError, SquishResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of temporary generation homes
pub const TEMP_PREFIX: &str = "squish-lockfile-";

/// Directory tree sbt and Coursier write into during generation
///
/// ```text
/// <root>/
///   .cache/coursier/   artifact cache (COURSIER_CACHE)
///   .sbt/              SBT_GLOBAL_BASE
///   .sbt/boot/         SBT_BOOT_DIRECTORY
///   .ivy2/cache/       legacy Ivy cache, expected to stay empty
/// ```
#[derive(Debug)]
pub struct BuildHome {
    root: PathBuf,
    // Removes the tree on drop unless created with `keep`
    _temp: Option<TempDir>,
}

impl BuildHome {
    /// Create a fresh home in the system temp directory
    ///
    /// With `keep`, the directory survives the handle for debugging.
    pub fn create_temp(keep: bool) -> SquishResult<Self> {
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .disable_cleanup(keep)
            .tempdir()
            .map_err(|e| SquishError::io("creating temporary build home", e))?;

        let home = Self {
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        };
        home.init()?;
        Ok(home)
    }

    /// Use an existing directory as the home; it is never removed
    pub fn at(root: impl Into<PathBuf>) -> SquishResult<Self> {
        let home = Self {
            root: root.into(),
            _temp: None,
        };
        home.init()?;
        Ok(home)
    }

    fn init(&self) -> SquishResult<()> {
        for dir in [self.coursier_cache(), self.sbt_boot()] {
            std::fs::create_dir_all(&dir)
                .map_err(|e| SquishError::io(format!("creating {}", dir.display()), e))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The artifact cache scanned after generation
    pub fn coursier_cache(&self) -> PathBuf {
        self.root.join(".cache").join("coursier")
    }

    pub fn sbt_global(&self) -> PathBuf {
        self.root.join(".sbt")
    }

    pub fn sbt_boot(&self) -> PathBuf {
        self.sbt_global().join("boot")
    }

    pub fn ivy_cache(&self) -> PathBuf {
        self.root.join(".ivy2").join("cache")
    }

    /// Environment that points sbt, Coursier and the JVM at this home
    pub fn env(&self, network_allowed: bool) -> Vec<(String, String)> {
        let inherited = std::env::var("_JAVA_OPTIONS").ok();
        self.env_with(network_allowed, inherited.as_deref())
    }

    fn env_with(&self, network_allowed: bool, inherited_java_opts: Option<&str>) -> Vec<(String, String)> {
        let root = self.root.display().to_string();
        let cache = self.coursier_cache().display().to_string();
        let boot = self.sbt_boot().display().to_string();

        let mut sbt_opts = format!("-Dsbt.boot.directory={} -Dsbt.coursier.home={}", boot, cache);
        if !network_allowed {
            sbt_opts.push_str(" -Dsbt.offline=true");
        }

        // JVM tools launched outside sbt (ammonite, scalafmt) read user.home
        let java_opts = match inherited_java_opts {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{} -Duser.home={}", existing, root)
            }
            _ => format!("-Duser.home={}", root),
        };

        let mut env = vec![
            ("HOME".to_string(), root),
            ("COURSIER_CACHE".to_string(), cache),
            ("SBT_GLOBAL_BASE".to_string(), self.sbt_global().display().to_string()),
            ("SBT_BOOT_DIRECTORY".to_string(), boot),
            ("SBT_OPTS".to_string(), sbt_opts),
            ("_JAVA_OPTIONS".to_string(), java_opts),
        ];
        if !network_allowed {
            env.push(("COURSIER_MODE".to_string(), "offline".to_string()));
        }
        env
    }

    /// Expand variables in a command argument
    ///
    /// `$HOME` and `${HOME}` become this home; any other `$VAR` or `${VAR}`
    /// comes from the process environment. Unknown variables stay as written.
    pub fn expand(&self, arg: &str) -> String {
        self.expand_with(arg, |name| std::env::var(name).ok())
    }

    fn expand_with(&self, arg: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
        let root = self.root.display().to_string();
        let arg = arg.replace("${HOME}", &root).replace("$HOME", &root);
        expand_vars(&arg, lookup)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Substitute `$NAME` and `${NAME}` references using `lookup`
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, reference_len) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .char_indices()
                .find(|&(_, c)| !is_name_char(c))
                .map_or(after.len(), |(i, _)| i);
            (&after[..end], end)
        };

        let value = if name.is_empty() { None } else { lookup(name) };
        match value {
            Some(value) => {
                out.push_str(&value);
                rest = &after[reference_len..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
