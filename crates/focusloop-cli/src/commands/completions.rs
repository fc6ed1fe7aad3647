use clap_complete::{generate, Shell};

pub fn run(shell: Shell, cmd: &mut clap::Command) {
    generate(shell, cmd, "focusloop", &mut std::io::stdout());
}
