use super::VariantSpec;
use crate::script::PackageTarget;
use lambda_builder_schema::Language;

pub(super) static SPEC: VariantSpec = VariantSpec {
    language: Language::Python,
    markers: &["requirements.txt", "poetry.lock", "Pipfile.lock"],
    build_image: "mlupin/docker-lambda:python{version}-build",
    run_image: "mlupin/docker-lambda:python{version}",
    versioned: true,
    handlers: &[
        ("app.py", "app.handler"),
        ("function.py", "function.handler"),
        ("lambda_function.py", "lambda_function.handler"),
        ("main.py", "main.handler"),
    ],
    task_dir: "/var/task",
    package: PackageTarget::TaskDir,
    preamble: "export PYTHONUNBUFFERED=1",
    install: INSTALL,
};

// Dependencies land in a project virtualenv first, then its site-packages is
// flattened into the task directory where the runtime looks for modules.
const INSTALL: &str = r#"python-major-minor() {
  python -c 'import sys; print(str(sys.version_info[0])+"."+str(sys.version_info[1]))'
}

install-pip() {
  puts-step "Installing dependencies via pip"
  version="$(python-major-minor)"
  mkdir -p ".venv/lib/python${version}"
  pip install --target ".venv/lib/python${version}/site-packages" -r requirements.txt 2>&1 | indent
}

install-pipenv() {
  puts-step "Creating virtualenv"
  virtualenv -p python .venv | indent

  puts-step "Installing dependencies via pipenv"
  export PIPENV_VENV_IN_PROJECT=1
  if [[ ! -f "Pipfile.lock" ]]; then
    pipenv install --skip-lock 2>&1 | indent
  else
    pipenv install --deploy 2>&1 | indent
  fi
}

install-poetry() {
  puts-step "Installing dependencies via poetry"
  poetry config virtualenvs.create true
  poetry config virtualenvs.in-project true
  poetry install --no-dev 2>&1 | indent
}

flatten-site-packages() {
  local site_packages
  site_packages="/var/task/.venv/lib/python$(python-major-minor)/site-packages"
  if [[ ! -d "$site_packages" ]]; then
    return
  fi

  puts-step "Writing dependencies to correct path"
  find "$site_packages" -type f -print0 | xargs -0 -r chmod 644
  find "$site_packages" -type d -print0 | xargs -0 -r chmod 755
  cp -a --no-clobber "$site_packages"/. /var/task/
  rm -rf /var/task/.venv
}

install-dependencies() {
  if [[ -f "requirements.txt" ]]; then
    install-pip
  elif [[ -f "Pipfile" ]]; then
    install-pipenv
  elif [[ -f "poetry.lock" ]] || [[ -f "pyproject.toml" ]]; then
    install-poetry
  else
    puts-warning "No dependency file detected"
    exit 1
  fi

  flatten-site-packages
}"#;
