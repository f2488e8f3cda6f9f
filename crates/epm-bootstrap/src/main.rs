//! Process entry point. There is no scripting host in this tree to hand
//! the registry off to, so `main` plays that role itself: it builds the
//! [`Registry`](epm_host::Registry) and [`Globals`](epm_host::Globals), does
//! the one-time process bootstrap a real embedding layer would also need
//! (logging, lazy git init on first use), and returns the documented exit
//! code convention.

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let exit_code = match run() {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(%error, "fatal startup error");
            -1
        }
    };

    std::process::exit(exit_code);
}

fn run() -> anyhow::Result<i32> {
    let globals = epm_host::Globals::detect();
    let registry = epm_host::Registry::new()?;

    tracing::info!(
        version = globals.version,
        platform = globals.platform,
        arch = %globals.arch,
        "epm-bootstrap starting"
    );

    println!("{} {} ({})", globals.version, globals.platform, globals.arch);
    println!("entry points:");
    for name in registry.entry_point_names() {
        println!("  {name}");
    }

    // A real embedding layer would now load and run the business-logic
    // script and return whatever integer it leaves on top of the stack.
    // There's nothing to hand off to here, so this stands in for that
    // layer having run and returned success.
    Ok(0)
}
