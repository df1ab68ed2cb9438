//! Confirmation prompts on stdin.

use std::io::{self, BufRead, Write};

/// Ask a yes/no question; anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> io::Result<bool> {
    let answer = ask(&format!("{} [y/N]: ", question))?;
    Ok(is_yes(&answer))
}

/// Require the operator to type `expected` exactly.
pub fn confirm_typed(expected: &str) -> io::Result<bool> {
    let answer = ask(&format!("Type '{}' to confirm: ", expected))?;
    Ok(answer.trim() == expected)
}

fn ask(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
