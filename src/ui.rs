// UI layer: a simple interactive menu using `dialoguer`. Each submission
// runs to completion (preview, encode, request, render) before the menu is
// shown again, so submissions never overlap.

use crate::api::ApiClient;
use crate::render::{self, Message};
use crate::upload::{self, IMAGE_EXTENSIONS};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main interactive menu. Runs a select loop until the user picks "Exit".
pub fn main_menu(api: &ApiClient) -> Result<()> {
    println!("Car detection, backend {}", api.detect_url());
    loop {
        let items = vec!["Pick image (file dialog)", "Enter image path", "Exit"];
        let selection = Select::new().items(&items).default(0).interact()?;
        let picked = match selection {
            0 => pick_with_dialog(),
            1 => prompt_path()?,
            2 => break,
            _ => continue,
        };
        submit(api, picked)?;
    }
    Ok(())
}

/// Run one submission for an optional selection and print the outcome.
/// Returns whether it ended in success; no selection counts as success
/// since nothing is shown.
pub fn submit(api: &ApiClient, picked: Option<PathBuf>) -> Result<bool> {
    let path = match upload::selected(picked) {
        Ok(p) => p,
        Err(_) => return Ok(true),
    };

    // Same filter as the picker, so typed and one-shot paths match it.
    if let Err(e) = upload::require_image(&path) {
        print_message(render::render_error(&e).as_ref());
        return Ok(false);
    }

    // Preview goes out before any network work.
    match upload::preview(&path) {
        Ok(p) => println!("{}", p),
        Err(e) => {
            let msg = render::render_error(&e);
            print_message(msg.as_ref());
            return Ok(false);
        }
    }

    let outcome = with_spinner("Analyzing image...", || api.analyze_file(&path))?;
    let msg = render::render(&outcome);
    print_message(msg.as_ref());
    if let Ok(result) = &outcome {
        if let Some(id) = &result.id {
            println!("Stored as {}", id);
        }
    }
    Ok(msg.map(|m| m.is_success()).unwrap_or(true))
}

fn print_message(msg: Option<&Message>) {
    match msg {
        Some(m @ Message::Success(_)) => println!("{}", m.text().green()),
        Some(m @ Message::Failure(_)) => println!("{}", m.text().red()),
        None => {}
    }
}

/// Native file dialog restricted to images. Cancelling yields `None`.
fn pick_with_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select an image")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

/// Typed path, validated as an image. An empty answer means no file.
fn prompt_path() -> Result<Option<PathBuf>> {
    let raw: String = Input::new()
        .with_prompt("Image file path (empty to cancel)")
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), String> {
            if input.trim().is_empty() || upload::is_image(Path::new(input.trim())) {
                Ok(())
            } else {
                Err(format!("Not an image file, expected one of: {}", IMAGE_EXTENSIONS.join(", ")))
            }
        })
        .interact_text()?;
    let trimmed = raw.trim();
    Ok(if trimmed.is_empty() { None } else { Some(PathBuf::from(trimmed)) })
}

fn with_spinner<T>(msg: &'static str, f: impl FnOnce() -> T) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    Ok(out)
}
