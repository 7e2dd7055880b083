use std::process::Command;

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/heads");

    // Short commit hash, shown in `witkit --version`
    let hash = run_git(&["rev-parse", "--short=8", "HEAD"]).unwrap_or_else(|| "unknown".into());
    let dirty = match run_git(&["status", "--porcelain"]) {
        Some(status) if !status.is_empty() => "-dirty",
        _ => "",
    };

    println!("cargo::rustc-env=GIT_HASH={hash}{dirty}");
}
