use eca30_core::selftest;

pub fn run() {
    let report = selftest::run();

    println!("Rule 30 self-test");
    println!("  {:<22} {:>6}", "Check", "Result");
    println!("  {}", "-".repeat(30));
    for check in &report.checks {
        let mark = if check.passed { "ok" } else { "FAIL" };
        println!("  {:<22} {:>6}", check.name, mark);
        if !check.passed {
            println!("    {}", check.detail);
        }
    }

    if report.passed {
        println!("\nAll checks passed.");
    } else {
        eprintln!("\nSelf-test failed.");
        std::process::exit(1);
    }
}
