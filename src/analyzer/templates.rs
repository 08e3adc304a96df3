/// Manifest/lock pair of a package manager and the commands that
/// regenerate and install from the lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockPair {
    pub manager: &'static str,
    pub manifest: &'static str,
    pub lock: &'static str,
    pub relock: &'static str,
    pub install: &'static str,
}

pub const LOCK_PAIRS: &[LockPair] = &[
    LockPair {
        manager: "poetry",
        manifest: "pyproject.toml",
        lock: "poetry.lock",
        relock: "poetry lock --no-update",
        install: "poetry install",
    },
    LockPair {
        manager: "npm",
        manifest: "package.json",
        lock: "package-lock.json",
        relock: "npm install --package-lock-only",
        install: "npm ci",
    },
    LockPair {
        manager: "yarn",
        manifest: "package.json",
        lock: "yarn.lock",
        relock: "yarn install",
        install: "yarn install --frozen-lockfile",
    },
    LockPair {
        manager: "pnpm",
        manifest: "package.json",
        lock: "pnpm-lock.yaml",
        relock: "pnpm install --lockfile-only",
        install: "pnpm install --frozen-lockfile",
    },
    LockPair {
        manager: "cargo",
        manifest: "Cargo.toml",
        lock: "Cargo.lock",
        relock: "cargo update --workspace",
        install: "cargo build --locked",
    },
    LockPair {
        manager: "bundler",
        manifest: "Gemfile",
        lock: "Gemfile.lock",
        relock: "bundle lock",
        install: "bundle install",
    },
    LockPair {
        manager: "composer",
        manifest: "composer.json",
        lock: "composer.lock",
        relock: "composer update --lock",
        install: "composer install",
    },
    LockPair {
        manager: "pip",
        manifest: "requirements.in",
        lock: "requirements.txt",
        relock: "pip-compile requirements.in",
        install: "pip install -r requirements.txt",
    },
];

/// Picks the pair whose lock file (or, failing that, manager name) shows
/// up in `text`. Defaults to poetry.
pub fn lock_pair_for(text: &str) -> &'static LockPair {
    LOCK_PAIRS
        .iter()
        .find(|pair| text.contains(&pair.lock.to_lowercase()))
        .or_else(|| LOCK_PAIRS.iter().find(|pair| mentions_word(text, pair.manager)))
        .unwrap_or(&LOCK_PAIRS[0])
}

fn mentions_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric() && c != '-')
        .any(|token| token == word)
}

pub fn dependency_root_cause(pair: &LockPair) -> String {
    format!(
        "{} is out of sync with {}. The dependency manifest changed since the lock file was last generated.",
        pair.lock, pair.manifest
    )
}

pub fn dependency_solution(pair: &LockPair) -> String {
    format!(
        "1. Regenerate the lock file:\n   {}\n\n\
         2. Install dependencies from the updated lock:\n   {}\n\n\
         3. Commit the updated lock file:\n   git add {} && git commit -m \"Update {}\"",
        pair.relock, pair.install, pair.lock, pair.lock
    )
}

pub fn missing_file_root_cause(path: Option<&str>) -> String {
    match path {
        Some(path) => format!(
            "Required file not found: {}. The command may be running from the wrong working directory or the file was never created.",
            path
        ),
        None => "A required file or module was not found. The command may be running from the wrong working directory or a manifest is missing.".to_string(),
    }
}

pub fn missing_file_solution(path: Option<&str>) -> String {
    let target = path.unwrap_or("the missing file");
    format!(
        "1. Verify the working directory:\n   pwd && ls -la\n\n\
         2. Make sure {} exists and is committed (or generated before this step).\n\n\
         3. Fix the path in the command or build configuration if it points to the wrong location.",
        target
    )
}

pub const TIMEOUT_ROOT_CAUSE: &str =
    "The command exceeded its time budget and was terminated before completing.";

pub const TIMEOUT_SOLUTION: &str = "1. Run the command manually to see where it hangs or slows down.\n\n\
     2. Increase the timeout, or add an explicit one, if the work legitimately takes longer.\n\n\
     3. Check for interactive prompts or waits on network resources that never resolve.";

pub fn permission_root_cause(virtualenv_user_install: bool) -> String {
    if virtualenv_user_install {
        "A `--user` install was attempted inside a virtualenv, where user site-packages are not visible.".to_string()
    } else {
        "The command was denied access to a file, directory or device it needs.".to_string()
    }
}

pub fn permission_solution(virtualenv_user_install: bool) -> String {
    if virtualenv_user_install {
        "1. Remove the --user flag when installing inside a virtualenv:\n   pip install <package>\n\n\
         2. Or deactivate the virtualenv if a user-level install is really intended."
            .to_string()
    } else {
        "1. Check ownership and mode of the files involved:\n   ls -la\n\n\
         2. Fix permissions (chmod / chown) instead of running the command as root.\n\n\
         3. For package installs, prefer a virtual environment or project-local install."
            .to_string()
    }
}

pub fn syntax_root_cause(yaml: bool) -> String {
    if yaml {
        "A YAML document could not be parsed (invalid syntax or an unknown tag/constructor).".to_string()
    } else {
        "A source or configuration file contains a syntax error.".to_string()
    }
}

pub fn syntax_solution(yaml: bool) -> String {
    if yaml {
        "1. Validate the YAML file:\n   yamllint <file>\n\n\
         2. Remove or register custom tags (e.g. use yaml.safe_load with known types).\n\n\
         3. Check indentation and quoting around the reported line."
            .to_string()
    } else {
        "1. Open the file at the line reported in the error.\n\n\
         2. Fix the syntax (missing brackets, quotes, or separators).\n\n\
         3. Run the project's linter before committing."
            .to_string()
    }
}

pub const CONFIGURATION_ROOT_CAUSE: &str =
    "The command failed because of invalid or missing configuration.";

pub const CONFIGURATION_SOLUTION: &str = "1. Review the configuration files and settings used by the command.\n\n\
     2. Check that required environment variables are set.\n\n\
     3. Compare against a known-good configuration or the documented defaults.";

pub fn fatal_signal_root_cause(return_code: i32) -> String {
    format!(
        "The process was terminated by a fatal signal (return code {}), e.g. a segmentation fault or abort.",
        return_code
    )
}

pub const FATAL_SIGNAL_SOLUTION: &str = "1. Re-run the command with a debugger or core dumps enabled:\n   ulimit -c unlimited\n\n\
     2. Check native dependencies and toolchain versions for known crashes.\n\n\
     3. Reduce the input until the crash is reproducible in isolation.";

pub fn fallback_root_cause(return_code: i32) -> String {
    format!(
        "The command failed with return code {}; no known failure pattern matched.",
        return_code
    )
}

pub const FALLBACK_SOLUTION: &str = "1. Inspect the full error output above.\n\n\
     2. Re-run the command locally with verbose output.\n\n\
     3. Check recent changes to the build scripts or dependencies.";
