use std::fmt::Write as _;

/// Label key stamped on everything a build creates.
pub const BUILDER_LABEL: &str = "com.dokku.lambda-builder/builder";

/// Label marking the container that copies the artifact out of a build image.
pub const EXTRACTOR_LABEL: &str = "com.dokku.lambda-builder/extractor=true";

/// Where the build-stage image installs the build script.
const INSTALLED_SCRIPT: &str = "/usr/local/bin/build-lambda";

/// Dockerfile for the image build strategy: sources are copied into the
/// build image and the script runs as a `RUN` step.
#[derive(Debug, Clone)]
pub struct BuildStageDockerfile<'a> {
    pub build_image: &'a str,
    pub builder_name: &'a str,
    pub task_dir: &'a str,
    pub env: &'a [String],
    /// Script file name relative to the build context.
    pub script_name: &'a str,
}

impl BuildStageDockerfile<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "FROM {}", self.build_image);
        let _ = writeln!(out, "LABEL {BUILDER_LABEL}={}", self.builder_name);
        let _ = writeln!(out, "ENV LAMBDA_BUILD_ZIP=1");
        let _ = writeln!(out, "WORKDIR {}", self.task_dir);
        let _ = writeln!(out, "COPY . {}", self.task_dir);
        for assignment in self.env {
            let _ = writeln!(out, "{}", env_line(assignment));
        }
        let _ = writeln!(out, "RUN mv {} {INSTALLED_SCRIPT} && \\", self.script_name);
        let _ = writeln!(out, "    chmod +x {INSTALLED_SCRIPT} && \\");
        let _ = writeln!(out, "    {INSTALLED_SCRIPT}");
        out
    }
}

/// Dockerfile for the runnable image committed after a successful build.
#[derive(Debug, Clone)]
pub struct RunStageDockerfile<'a> {
    pub run_image: &'a str,
    pub port: Option<u16>,
    pub env: &'a [String],
    /// Handler baked in as the default command; empty means no `CMD`.
    pub command: &'a str,
    pub task_dir: &'a str,
}

impl RunStageDockerfile<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "FROM {}", self.run_image);
        if let Some(port) = self.port {
            let _ = writeln!(out, "ENV DOCKER_LAMBDA_API_PORT={port}");
            let _ = writeln!(out, "ENV DOCKER_LAMBDA_RUNTIME_PORT={port}");
        }
        for assignment in self.env {
            let _ = writeln!(out, "{}", env_line(assignment));
        }
        if !self.command.is_empty() {
            let _ = writeln!(out, "CMD [{}]", json_string(self.command));
        }
        let _ = writeln!(out, "COPY . {}", self.task_dir);
        out
    }
}

/// `ENV KEY=VALUE`, quoting the value when Dockerfile parsing would split it.
fn env_line(assignment: &str) -> String {
    match assignment.split_once('=') {
        Some((key, value)) if needs_quoting(value) => {
            format!("ENV {key}={}", json_string(value))
        }
        _ => format!("ENV {assignment}"),
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | '$'))
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_stage_layout() {
        let env = vec!["PIP_INDEX_URL=https://pypi.example".to_owned()];
        let rendered = BuildStageDockerfile {
            build_image: "mlupin/docker-lambda:python3.9-build",
            builder_name: "python",
            task_dir: "/var/task",
            env: &env,
            script_name: ".lambda-builder",
        }
        .render();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "FROM mlupin/docker-lambda:python3.9-build");
        assert_eq!(lines[1], "LABEL com.dokku.lambda-builder/builder=python");
        assert_eq!(lines[2], "ENV LAMBDA_BUILD_ZIP=1");
        assert_eq!(lines[3], "WORKDIR /var/task");
        assert_eq!(lines[4], "COPY . /var/task");
        assert_eq!(lines[5], "ENV PIP_INDEX_URL=https://pypi.example");
        assert!(lines[6].starts_with("RUN mv .lambda-builder /usr/local/bin/build-lambda"));
        assert!(rendered.ends_with("/usr/local/bin/build-lambda\n"));
    }

    #[test]
    fn run_stage_with_port_and_handler() {
        let env = vec!["STAGE=prod".to_owned()];
        let rendered = RunStageDockerfile {
            run_image: "mlupin/docker-lambda:python3.9",
            port: Some(9001),
            env: &env,
            command: "app.handler",
            task_dir: "/var/task",
        }
        .render();

        assert_eq!(
            rendered,
            "FROM mlupin/docker-lambda:python3.9\n\
             ENV DOCKER_LAMBDA_API_PORT=9001\n\
             ENV DOCKER_LAMBDA_RUNTIME_PORT=9001\n\
             ENV STAGE=prod\n\
             CMD [\"app.handler\"]\n\
             COPY . /var/task\n"
        );
    }

    #[test]
    fn run_stage_without_port_or_handler() {
        let rendered = RunStageDockerfile {
            run_image: "lambci/lambda:go1.x",
            port: None,
            env: &[],
            command: "",
            task_dir: "/var/task",
        }
        .render();

        assert!(!rendered.contains("DOCKER_LAMBDA_API_PORT"));
        assert!(!rendered.contains("CMD"));
        assert_eq!(rendered, "FROM lambci/lambda:go1.x\nCOPY . /var/task\n");
    }

    #[test]
    fn env_values_with_spaces_are_quoted() {
        assert_eq!(env_line("GREETING=hello world"), "ENV GREETING=\"hello world\"");
        assert_eq!(env_line("EMPTY="), "ENV EMPTY=\"\"");
        assert_eq!(env_line("PLAIN=value"), "ENV PLAIN=value");
    }

    #[test]
    fn handler_is_json_escaped() {
        let rendered = RunStageDockerfile {
            run_image: "img",
            port: None,
            env: &[],
            command: "weird\"handler",
            task_dir: "/var/task",
        }
        .render();
        assert!(rendered.contains(r#"CMD ["weird\"handler"]"#));
    }
}
