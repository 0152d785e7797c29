//! Build script rendering.
//!
//! Every variant runs the same bash skeleton (output helpers, hooks,
//! packaging) around its own install step. The skeleton is parameterized by
//! where the sources are, where the package goes and what is packed.

use std::fmt::Write as _;

/// Variable that must be `1` for the script to produce an archive.
pub const PACKAGE_FLAG: &str = "LAMBDA_BUILD_ZIP";

/// Mount point of the working directory inside the build container.
pub const SOURCE_MOUNT: &str = "/tmp/task";

pub const PRE_COMPILE_HOOK: &str = "bin/pre_compile";
pub const POST_COMPILE_HOOK: &str = "bin/post_compile";

/// What ends up inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageTarget {
    /// Everything visible in the task directory.
    TaskDir,
    /// A single build product, relative to the task directory.
    File(&'static str),
}

#[derive(Debug, Clone)]
pub struct ScriptParams<'a> {
    pub task_dir: &'a str,
    /// Copied into `task_dir` first when set; `None` when the sources were
    /// already baked into the image.
    pub source_mount: Option<&'a str>,
    /// Directory the finished archive is moved to.
    pub output_dir: &'a str,
    pub pre_compile_hook: &'a str,
    pub post_compile_hook: &'a str,
    pub package: PackageTarget,
    pub package_flag: &'a str,
    pub artifact_name: &'a str,
    /// Exported settings placed before anything runs.
    pub preamble: &'a str,
    /// Bash defining an `install-dependencies` function.
    pub install: &'a str,
}

impl ScriptParams<'_> {
    pub fn render(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "#!/usr/bin/env bash");
        let _ = writeln!(s, "set -eo pipefail");
        let _ = writeln!(s);
        if !self.preamble.is_empty() {
            let _ = writeln!(s, "{}", self.preamble.trim_end());
            let _ = writeln!(s);
        }
        s.push_str(HELPERS);
        let _ = writeln!(s);
        let _ = writeln!(s, "{}", self.install.trim_end());
        let _ = writeln!(s);
        self.render_package(&mut s);
        let _ = writeln!(s);

        if let Some(mount) = self.source_mount {
            let _ = writeln!(s, "mkdir -p {}", self.task_dir);
            let _ = writeln!(s, "cp -a {mount}/. {}", self.task_dir);
        }
        let _ = writeln!(s, "cd {}", self.task_dir);
        let _ = writeln!(s, "run-hook {} pre-compile", self.pre_compile_hook);
        let _ = writeln!(s, "install-dependencies");
        let _ = writeln!(s, "run-hook {} post-compile", self.post_compile_hook);
        let _ = writeln!(s, "package-artifact");
        s
    }

    fn render_package(&self, s: &mut String) {
        let contents = match self.package {
            PackageTarget::TaskDir => "./*",
            PackageTarget::File(name) => name,
        };
        let artifact = self.artifact_name;
        let _ = writeln!(s, "package-artifact() {{");
        let _ = writeln!(s, "  if [[ \"${}\" != \"1\" ]]; then", self.package_flag);
        let _ = writeln!(s, "    return");
        let _ = writeln!(s, "  fi");
        let _ = writeln!(s);
        let _ = writeln!(s, "  puts-step \"Creating package at {artifact}\"");
        let _ = writeln!(s, "  rm -f {artifact}");
        let _ = writeln!(s, "  zip -q -r {artifact} {contents}");
        if self.output_dir.trim_end_matches('/') != self.task_dir.trim_end_matches('/') {
            let _ = writeln!(s, "  mv {artifact} {}/{artifact}", self.output_dir);
        }
        let _ = writeln!(s, "}}");
    }
}

const HELPERS: &str = r#"indent() {
  sed -u "s/^/       /"
}

puts-header() {
  echo "=====> $*"
}

puts-step() {
  echo "-----> $*"
}

puts-warning() {
  echo " !     $*"
}

run-hook() {
  local hook="$1" label="$2"
  if [[ ! -f "$hook" ]]; then
    return
  fi

  puts-step "Running $label hook"
  chmod +x "$hook"
  "$hook"
}
"#;
