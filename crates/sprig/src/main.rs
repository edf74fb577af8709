use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use sprig_core::Object;
use sprig_eval::{Interpreter, SPECIAL_FORM_NAMES};

#[derive(Parser)]
#[command(name = "sprig", about = "Sprig: a small Scheme with a bounded, collected heap")]
struct Cli {
    /// Script file to execute
    file: Option<String>,

    /// Evaluate an expression and exit
    #[arg(short, long)]
    eval: Option<String>,

    /// Hard ceiling on live heap objects
    #[arg(long, default_value_t = 65_536)]
    heap_size: usize,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut interp = Interpreter::with_heap_capacity(cli.heap_size);

    if let Some(src) = &cli.eval {
        run_source(&mut interp, src, true);
        return;
    }

    if let Some(file) = &cli.file {
        match std::fs::read_to_string(file) {
            Ok(content) => run_source(&mut interp, &content, false),
            Err(e) => {
                eprintln!("Error reading {file}: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    repl(interp);
}

/// Evaluate every top-level form in `src`, one balanced expression per
/// parse call. With `echo_last`, print the final non-nil result.
fn run_source(interp: &mut Interpreter, src: &str, echo_last: bool) {
    let forms = split_forms(src);
    let mut last = interp.heap().nil();
    for form in &forms {
        match interp.eval_str(form) {
            Ok(val) => last = val,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
    if echo_last && !interp.heap().is_nil(last) {
        println!("{}", interp.print(last));
    }
}

fn repl(mut interp: Interpreter) {
    let mut rl = DefaultEditor::new().expect("failed to create editor");
    let history_path = dirs_path().join("history.txt");
    let _ = rl.load_history(&history_path);

    println!("Sprig v{}", env!("CARGO_PKG_VERSION"));
    println!("Type ,help for help, ,quit to exit\n");

    let mut buffer = String::new();
    let mut in_multiline = false;

    loop {
        let prompt = if in_multiline { "  ... " } else { "sprig> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if !in_multiline {
                    match trimmed {
                        ",quit" | ",exit" | ",q" => break,
                        ",help" | ",h" => {
                            print_help();
                            continue;
                        }
                        ",env" => {
                            print_env(&interp);
                            continue;
                        }
                        ",gc" => {
                            let freed = interp.heap_mut().collect();
                            println!(
                                "freed {freed} objects, {} live of {}",
                                interp.heap().live_count(),
                                interp.heap().capacity()
                            );
                            continue;
                        }
                        _ => {}
                    }
                }

                if in_multiline {
                    buffer.push('\n');
                    buffer.push_str(&line);
                } else {
                    buffer = line.clone();
                }

                // Keep reading until the parentheses balance.
                if !is_balanced(&buffer) {
                    in_multiline = true;
                    continue;
                }

                in_multiline = false;
                let input = buffer.trim().to_string();
                buffer.clear();

                if input.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&input);

                match interp.eval_str(&input) {
                    Ok(val) => {
                        if !interp.heap().is_nil(val) {
                            println!("{}", interp.print(val));
                        }
                    }
                    Err(e) => {
                        eprintln!("Error: {e}");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                if in_multiline {
                    buffer.clear();
                    in_multiline = false;
                    println!("^C");
                    continue;
                }
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(dirs_path());
    let _ = rl.save_history(&history_path);
}

/// One pass over the source, honoring strings and comments, slicing out
/// each top-level balanced form.
fn split_forms(input: &str) -> Vec<String> {
    let mut forms = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut delim = '"';
    let mut escape = false;
    let mut in_comment = false;
    let mut start: Option<usize> = None;

    for (i, ch) in input.char_indices() {
        let next = i + ch.len_utf8();
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == delim {
                in_string = false;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        forms.push(input[s..next].to_string());
                    }
                }
            }
            continue;
        }
        match ch {
            ';' => {
                if depth == 0 {
                    if let Some(s) = start.take() {
                        forms.push(input[s..i].to_string());
                    }
                }
                in_comment = true;
            }
            '"' | '\'' => {
                if depth == 0 {
                    if let Some(s) = start.take() {
                        forms.push(input[s..i].to_string());
                    }
                }
                if start.is_none() {
                    start = Some(i);
                }
                in_string = true;
                delim = ch;
            }
            '(' => {
                if depth == 0 {
                    if let Some(s) = start.take() {
                        forms.push(input[s..i].to_string());
                    }
                }
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        forms.push(input[s..next].to_string());
                    }
                }
            }
            c if c.is_whitespace() => {
                if depth == 0 {
                    if let Some(s) = start.take() {
                        forms.push(input[s..i].to_string());
                    }
                }
            }
            _ => {
                if start.is_none() {
                    start = Some(i);
                }
            }
        }
    }
    if let Some(s) = start {
        let tail = input[s..].trim();
        if !tail.is_empty() {
            forms.push(tail.to_string());
        }
    }
    forms
}

fn is_balanced(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut delim = '"';
    let mut escape = false;
    let mut in_comment = false;
    for ch in input.chars() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            if ch == '\\' {
                escape = true;
            } else if ch == delim {
                in_string = false;
            }
            continue;
        }
        match ch {
            ';' => in_comment = true,
            '"' | '\'' => {
                in_string = true;
                delim = ch;
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0 && !in_string
}

fn print_help() {
    println!("Sprig REPL commands:");
    println!("  ,quit / ,q    Exit the REPL");
    println!("  ,help / ,h    Show this help");
    println!("  ,env          Show user-defined bindings");
    println!("  ,gc           Run a collection cycle and report");
    println!();
    println!("Special forms:");
    println!("  {}", SPECIAL_FORM_NAMES.join(", "));
    println!();
    println!("Builtins:");
    println!("  cons, car, cdr, pair?, null?, list, + - * = < > <= >=,");
    println!("  not, display, newline");
}

fn print_env(interp: &Interpreter) {
    let heap = interp.heap();
    let frame = match heap.get(interp.global_env()) {
        Object::Env { frame, .. } => frame,
        _ => return,
    };
    let mut user_bindings: Vec<_> = frame
        .iter()
        .filter(|(_, v)| !matches!(heap.get(*v), Object::Native(_)))
        .map(|(name, v)| (sprig_core::resolve(*name), *v))
        .collect();
    user_bindings.sort_by(|(a, _), (b, _)| a.cmp(b));
    if user_bindings.is_empty() {
        println!("(no user-defined bindings)");
    } else {
        for (name, val) in user_bindings {
            println!("  {name} = {}", interp.print(val));
        }
    }
}

fn dirs_path() -> std::path::PathBuf {
    std::env::var("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join(".sprig")
}
