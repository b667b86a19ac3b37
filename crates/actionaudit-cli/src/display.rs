use actionaudit_core::report::AuditReport;
use actionaudit_core::usage::ActionUsage;
use colored::*;

/// Print the audit report to the terminal.
pub fn print_audit_report(report: &AuditReport) {
    println!();
    println!(
        "{}",
        format!(
            " actionaudit v{} — {} ({} repositories scanned)",
            env!("CARGO_PKG_VERSION"),
            report.organization,
            report.repositories_scanned
        )
        .bold()
    );
    println!();

    println!(" {}", "Actions and the repositories they are used in".bold().underline());
    println!();

    if report.actions.is_empty() {
        println!(" {} No action references found.", "OK".green().bold());
        println!();
    }

    for action in &report.actions {
        print_action(action);
        println!();
    }

    println!(" {}", "=".repeat(60).dimmed());
    println!();
    print_summary(report);
}

fn print_action(action: &ActionUsage) {
    let header = if action.is_infected {
        format!(" {}:", action.reference).red().bold()
    } else {
        format!(" {}:", action.reference).bold()
    };
    println!("{}", header);
    println!(" {} Uses npm: {}", "|-".dimmed(), action.uses_npm);

    if action.is_infected {
        println!(
            " {} {} {}",
            "|-".dimmed(),
            "INFECTED:".red().bold(),
            action.is_infected
        );
        println!(
            " {} Infected packages: [{}]",
            "|-".dimmed(),
            action.infected_packages.join(", ").red()
        );
    } else {
        println!(" {} Infected: {}", "|-".dimmed(), action.is_infected);
    }

    println!(" {} Used in repositories:", "|-".dimmed());
    for repo in &action.used_by_repositories {
        println!("     - {}", repo);
    }
}

fn print_summary(report: &AuditReport) {
    let summary = &report.summary;

    println!(" {}", "Summary".bold().underline());
    println!(
        " {} Actions referenced:       {}",
        "|-".dimmed(),
        summary.total_actions
    );
    println!(
        " {} Actions using npm:        {}",
        "|-".dimmed(),
        summary.npm_actions
    );
    println!(
        " {} Infected actions:         {}",
        "|-".dimmed(),
        if summary.infected_actions > 0 {
            summary.infected_actions.to_string().red().bold().to_string()
        } else {
            "0".green().to_string()
        }
    );
    println!(
        " {} Affected repositories:    {}",
        "|-".dimmed(),
        summary.affected_repositories
    );
    println!();

    if report.has_infections() {
        for action in report.infected() {
            println!(
                " {} {} pulls in {}",
                "WARNING".red().bold(),
                action.reference.bold(),
                action.infected_packages.join(", ")
            );
        }
        println!();
    } else {
        println!(
            " {} No action depends on a known-compromised package version.",
            "OK".green().bold()
        );
        println!();
    }
}
