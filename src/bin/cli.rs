use chrono::{Datelike, Local};
use std::env;
use std::process::ExitCode;
use worktime_tool::{
    CsvDefaults, DayRecord, RegularizationSummary, Timesheet, WorkRules, format_minutes,
    load_timesheet_from_csv, save_diagnostics_to_csv, save_timesheet_to_csv,
};

struct CliOptions {
    month: u32,
    year: i32,
    outfile: Option<String>,
    verbose: bool,
    full_table: bool,
    input: String,
}

fn print_help(program: &str) {
    println!(
        "Usage: {program} [OPT] FILE\n\nAvailable flags for OPT:\n  -m NUM  Initialize default month with NUM.\n  -y NUM  Initialize default year with NUM.\n  -o FILE Write results into FILE.\n  -f      Write the full diagnostic table instead of the adjusted schedule.\n  -v      Print verbose optimization summary.\n  -h      Print this message and terminate."
    );
}

fn parse_args(args: &[String]) -> Result<Option<CliOptions>, String> {
    let program = args
        .first()
        .map(|p| p.rsplit('/').next().unwrap_or(p).to_string())
        .unwrap_or_else(|| "cli".to_string());

    let today = Local::now().date_naive();
    let mut month = today.month();
    let mut year = today.year();
    let mut outfile = None;
    let mut verbose = false;
    let mut full_table = false;
    let mut input = None;

    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "-m" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "option -m expects a month number".to_string())?;
                month = value
                    .parse()
                    .map_err(|_| format!("invalid month '{value}'"))?;
            }
            "-y" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "option -y expects a year number".to_string())?;
                year = value
                    .parse()
                    .map_err(|_| format!("invalid year '{value}'"))?;
            }
            "-o" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "option -o expects a file name".to_string())?;
                outfile = Some(value.clone());
            }
            "-v" => verbose = true,
            "-f" => full_table = true,
            "-h" => {
                print_help(&program);
                return Ok(None);
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option '{other}'; see `{program} -h'"));
            }
            other => {
                if input.is_some() {
                    return Err(format!("unexpected extra argument '{other}'"));
                }
                input = Some(other.to_string());
            }
        }
        idx += 1;
    }

    let input = input.ok_or_else(|| format!("missing input file; see `{program} -h'"))?;
    Ok(Some(CliOptions {
        month,
        year,
        outfile,
        verbose,
        full_table,
        input,
    }))
}

fn day_markers(day: &DayRecord, rules: &WorkRules) -> String {
    let mut markers = day.flags.short_code();
    markers.push(if day.is_weekend() { 'w' } else { '-' });
    markers.push(if day.compliant.unwrap_or(true) { '-' } else { 'x' });
    let short_break = day
        .break_minutes
        .is_some_and(|brk| brk < rules.min_rest_minutes);
    markers.push(if short_break { 'b' } else { '-' });
    markers.push(if day.total_minutes > day.max_minutes { 'e' } else { '-' });
    markers
}

fn print_report(timesheet: &Timesheet, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rules = timesheet.rules();
    for day in timesheet.days()? {
        let new_from = day
            .new_from
            .map(|v| v.format("%H:%M").to_string())
            .unwrap_or_default();
        let new_till = day
            .new_till
            .map(|v| v.format("%H:%M").to_string())
            .unwrap_or_default();

        let info = if verbose {
            let new_break = day
                .new_break_minutes
                .map(format_minutes)
                .unwrap_or_else(|| "-".to_string());
            format!(
                " (total: {}, break: {}, adjust: +{})",
                format_minutes(day.new_total_minutes.unwrap_or(0)),
                new_break,
                format_minutes(day.adjustment_minutes)
            )
        } else {
            String::new()
        };

        println!(
            " [{}] {} {:02}.{:02}.{:04}   {} -- {}{}",
            day_markers(&day, rules),
            day.weekday_abbr(),
            day.date.day(),
            day.date.month(),
            day.date.year(),
            new_from,
            new_till,
            info
        );
    }
    Ok(())
}

fn print_rules(rules: &WorkRules) {
    println!("regulatory constraints:");
    println!("  max-total: {}", format_minutes(rules.max_regular_minutes));
    println!("  max-total (trip): {}", format_minutes(rules.max_trip_minutes));
    println!("  min-rest: {}", format_minutes(rules.min_rest_minutes));
    println!(
        "  window: {} -- {}",
        rules.earliest_start.format("%H:%M"),
        rules.latest_end.format("%H:%M")
    );
}

fn run(options: &CliOptions) -> Result<(), Box<dyn std::error::Error>> {
    let rules = WorkRules::default();
    let defaults = CsvDefaults {
        year: options.year,
        month: options.month,
    };

    if options.verbose {
        print_rules(&rules);
    }

    let mut timesheet = load_timesheet_from_csv(&options.input, defaults, rules)?;
    let summary: RegularizationSummary = timesheet.regularize()?;

    match &options.outfile {
        Some(outfile) => {
            if options.full_table {
                save_diagnostics_to_csv(&timesheet, outfile)?;
            } else {
                save_timesheet_to_csv(&timesheet, outfile)?;
            }
            println!("Results written to `{outfile}'.");
        }
        None => print_report(&timesheet, options.verbose)?,
    }

    println!("{}", summary.to_cli_summary());
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            return ExitCode::FAILURE;
        }
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
