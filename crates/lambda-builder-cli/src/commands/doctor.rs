use super::{json_pretty, OutputMode, EXIT_FAILURE, EXIT_SUCCESS};

pub fn run(out: OutputMode) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    check_prereqs(&mut checks, &mut all_pass);
    check_engine(&mut checks);

    print_results(&checks, all_pass, out)
}

fn check_prereqs(checks: &mut Vec<Check>, all_pass: &mut bool) {
    let missing = lambda_builder_runtime::check_docker_prereqs();
    if missing.is_empty() {
        checks.push(Check::pass(
            "docker",
            "docker CLI installed and daemon reachable",
        ));
    } else {
        *all_pass = false;
        checks.push(Check::fail(
            "docker",
            &format!(
                "Missing prerequisites: {}",
                lambda_builder_runtime::format_missing(&missing)
            ),
        ));
    }
}

fn check_engine(checks: &mut Vec<Check>) {
    match std::env::var("LAMBDA_BUILDER_ENGINE") {
        Ok(name) if lambda_builder_runtime::select_engine(&name).is_ok() => {
            checks.push(Check::info(
                "engine",
                &format!("LAMBDA_BUILDER_ENGINE selects the '{name}' engine"),
            ));
        }
        Ok(name) => checks.push(Check::warn(
            "engine",
            &format!("LAMBDA_BUILDER_ENGINE='{name}' is not a known engine, builds will fail"),
        )),
        Err(_) => checks.push(Check::info("engine", "Using the docker engine")),
    }
}

fn print_results(checks: &[Check], all_pass: bool, out: OutputMode) -> Result<u8, String> {
    if out.json {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!("{}", json_pretty(&json)?);
    } else {
        println!("lambda-builder doctor\n");
        for check in checks {
            let icon = match check.status {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }
    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_FAILURE })
}

struct Check {
    name: &'static str,
    status: &'static str,
    message: String,
}

impl Check {
    fn new(name: &'static str, status: &'static str, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }

    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn warn(name: &'static str, message: &str) -> Self {
        Self::new(name, "warn", message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, "info", message)
    }
}
