use std::borrow::Cow;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::Stylize;
use crossterm::terminal;
use reedline::{
    FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    Reedline, Signal,
};

use patent_cli::api_client::PatentApiClient;
use patent_cli::auth::{FileTokenStore, Session, SharedSession};
use patent_cli::config::Config;
use patent_cli::models::NewPatent;
use patent_cli::search::{SearchController, SearchState, SearchStatus};

struct PatentPrompt {
    session: SharedSession,
}

impl Prompt for PatentPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        match self.session.read().unwrap().user() {
            Some(user) => Cow::Owned(format!("{}@patents", user.name)),
            None => Cow::Borrowed("patents"),
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

fn print_help() {
    println!("{}", "Commands:".yellow());
    println!("  login <email>     authenticate against the registry");
    println!("  logout            drop the current session");
    println!("  whoami            show the logged-in identity");
    println!("  validate          check the token against the server");
    println!("  search            interactive search (type to filter, Esc to leave)");
    println!("  search <text>     one-shot search");
    println!("  list              show all patents");
    println!("  show <id>         full record for one patent");
    println!("  new               register a patent");
    println!("  edit <id>         update a patent");
    println!("  rm <id>           delete a patent");
    println!("  help              this text");
    println!("  quit              exit");
}

fn read_input_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Every protected command re-checks the session before touching the
/// network, so a logout takes effect on the very next command.
fn ensure_authenticated(session: &SharedSession) -> bool {
    if session.read().unwrap().is_authenticated() {
        true
    } else {
        eprintln!("{}", "Not logged in. Use: login <email>".red());
        false
    }
}

fn render_results(state: &SearchState) {
    match state.status {
        SearchStatus::Idle => println!("(nothing fetched yet)"),
        SearchStatus::Loading => println!("(still loading...)"),
        SearchStatus::Error => {
            let msg = state.error_message.as_deref().unwrap_or("unknown error");
            eprintln!("{}", format!("Search failed: {msg}").red());
        }
        SearchStatus::Ready if state.results.is_empty() => {
            println!("No patents found");
        }
        SearchStatus::Ready => {
            for patent in &state.results {
                println!(
                    "  {}  {} {}  {}",
                    patent.id.clone().dark_grey(),
                    patent.name.clone().cyan(),
                    format!("[{}]", patent.category).green(),
                    patent.created_at_display(),
                );
                if !patent.description.is_empty() {
                    println!("      {}", patent.description);
                }
            }
            println!("{} result(s)", state.results.len());
        }
    }
}

fn status_line(state: &SearchState) -> String {
    match state.status {
        SearchStatus::Idle => "idle".to_string(),
        SearchStatus::Loading => "loading...".to_string(),
        SearchStatus::Error => format!(
            "error: {}",
            state.error_message.as_deref().unwrap_or("unknown")
        ),
        SearchStatus::Ready => format!("{} result(s)", state.results.len()),
    }
}

/// Incremental search: each keystroke re-schedules the debounced fetch;
/// stale responses are discarded by the controller, so the line always
/// converges on the latest query.
fn live_search(controller: &SearchController<Arc<PatentApiClient>>) -> Result<()> {
    controller.initial_load();
    let mut query = String::new();

    terminal::enable_raw_mode()?;
    let outcome = (|| -> Result<()> {
        loop {
            let state = controller.snapshot();
            let line = format!("search: {} \u{2014} {}", query, status_line(&state));
            crossterm::execute!(
                std::io::stdout(),
                crossterm::cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine),
                crossterm::style::Print(line),
            )?;

            if !event::poll(Duration::from_millis(50))? {
                continue;
            }
            if let Event::Key(KeyEvent {
                code, modifiers, ..
            }) = event::read()?
            {
                match code {
                    KeyCode::Esc | KeyCode::Enter => break,
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Backspace => {
                        query.pop();
                        controller.set_query(&query);
                    }
                    KeyCode::Char(c) => {
                        query.push(c);
                        controller.set_query(&query);
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    })();
    terminal::disable_raw_mode()?;
    println!();

    // Leaving the view: no debounced fetch may fire after teardown.
    controller.cancel_pending();
    outcome?;
    render_results(&controller.snapshot());
    Ok(())
}

fn prompt_patent(defaults: Option<&NewPatent>) -> Result<NewPatent> {
    let hint = |field: &str, current: &str| {
        if current.is_empty() {
            format!("{field}: ")
        } else {
            format!("{field} [{current}]: ")
        }
    };
    let blank = NewPatent {
        name: String::new(),
        description: String::new(),
        category: String::new(),
    };
    let defaults = defaults.unwrap_or(&blank);

    let mut patent = defaults.clone();
    let name = read_input_line(&hint("Name", &defaults.name))?;
    if !name.is_empty() {
        patent.name = name;
    }
    let description = read_input_line(&hint("Description", &defaults.description))?;
    if !description.is_empty() {
        patent.description = description;
    }
    let category = read_input_line(&hint("Category", &defaults.category))?;
    if !category.is_empty() {
        patent.category = category;
    }
    Ok(patent)
}

fn dispatch(
    line: &str,
    rt: &tokio::runtime::Runtime,
    session: &SharedSession,
    api: &Arc<PatentApiClient>,
    controller: &SearchController<Arc<PatentApiClient>>,
) -> Result<bool> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };

    match command {
        "help" => print_help(),
        "quit" | "exit" => return Ok(false),

        "login" => {
            let email = if rest.is_empty() {
                read_input_line("Email: ")?
            } else {
                rest.to_string()
            };
            let password = read_input_line("Password: ")?;
            match rt.block_on(api.login(&email, &password)) {
                Ok(token) => match session.write().unwrap().login(&token) {
                    Ok(user) => println!("Welcome, {} ({})", user.name.clone().cyan(), user.role),
                    Err(e) => eprintln!("{}", format!("Login failed: {e}").red()),
                },
                Err(e) => eprintln!("{}", format!("Login failed: {}", e.summary()).red()),
            }
        }

        "logout" => {
            session.write().unwrap().logout();
            println!("Logged out");
        }

        "whoami" => match session.read().unwrap().user() {
            Some(user) => {
                println!("{} <{}> ({})", user.name, user.email, user.role);
            }
            None => println!("anonymous"),
        },

        "validate" => {
            if !ensure_authenticated(session) {
                return Ok(true);
            }
            match rt.block_on(api.validate()) {
                Ok(true) => println!("Token is valid"),
                Ok(false) => println!("{}", "Token was rejected by the server".yellow()),
                Err(e) => eprintln!("{}", format!("Could not validate: {}", e.summary()).red()),
            }
        }

        "search" => {
            if !ensure_authenticated(session) {
                return Ok(true);
            }
            if rest.is_empty() {
                live_search(controller)?;
            } else {
                rt.block_on(controller.search_now(rest));
                render_results(&controller.snapshot());
            }
        }

        "list" => {
            if !ensure_authenticated(session) {
                return Ok(true);
            }
            rt.block_on(controller.search_now(""));
            render_results(&controller.snapshot());
        }

        "show" => {
            if !ensure_authenticated(session) {
                return Ok(true);
            }
            if rest.is_empty() {
                eprintln!("{}", "Usage: show <id>".red());
                return Ok(true);
            }
            match rt.block_on(api.get_patent(rest)) {
                Ok(patent) => {
                    println!("{}  {}", "Name:".dark_grey(), patent.name);
                    println!("{}  {}", "Category:".dark_grey(), patent.category);
                    println!("{}  {}", "Registered:".dark_grey(), patent.created_at_display());
                    println!("{}", patent.description);
                }
                Err(e) => eprintln!("{}", format!("Error: {}", e.summary()).red()),
            }
        }

        "new" => {
            if !ensure_authenticated(session) {
                return Ok(true);
            }
            let patent = prompt_patent(None)?;
            match rt.block_on(api.create_patent(&patent)) {
                Ok(created) => println!("Created {}", created.id.clone().cyan()),
                Err(e) => eprintln!("{}", format!("Error: {}", e.summary()).red()),
            }
        }

        "edit" => {
            if !ensure_authenticated(session) {
                return Ok(true);
            }
            if rest.is_empty() {
                eprintln!("{}", "Usage: edit <id>".red());
                return Ok(true);
            }
            let current = match rt.block_on(api.get_patent(rest)) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("{}", format!("Error: {}", e.summary()).red());
                    return Ok(true);
                }
            };
            let defaults = NewPatent {
                name: current.name,
                description: current.description,
                category: current.category,
            };
            let updated = prompt_patent(Some(&defaults))?;
            match rt.block_on(api.update_patent(rest, &updated)) {
                Ok(_) => println!("Updated"),
                Err(e) => eprintln!("{}", format!("Error: {}", e.summary()).red()),
            }
        }

        "rm" => {
            if !ensure_authenticated(session) {
                return Ok(true);
            }
            if rest.is_empty() {
                eprintln!("{}", "Usage: rm <id>".red());
                return Ok(true);
            }
            let confirm = read_input_line(&format!("Delete {rest}? (y/n) [n]: "))?;
            if !confirm.eq_ignore_ascii_case("y") {
                println!("Cancelled");
                return Ok(true);
            }
            match rt.block_on(api.delete_patent(rest)) {
                Ok(()) => println!("Deleted"),
                Err(e) => eprintln!("{}", format!("Error: {}", e.summary()).red()),
            }
        }

        other => {
            eprintln!(
                "{}",
                format!("Unknown command: {other} (try 'help')").red()
            );
        }
    }

    Ok(true)
}

fn main() -> Result<()> {
    patent_cli::logging::init_tracing();

    let mut config = Config::load().context("loading config")?;
    if let Ok(url) = std::env::var("PATENT_API_URL") {
        config.api.base_url = url;
    }

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let store = FileTokenStore::at_default_path().context("opening token store")?;
    let session = Session::restore(Box::new(store)).into_shared();
    let api = Arc::new(
        PatentApiClient::new(&config.api, session.clone()).context("building api client")?,
    );
    let controller = SearchController::new(
        api.clone(),
        Duration::from_millis(config.behavior.search_debounce_ms),
    );

    println!(
        "{}",
        format!("Patent registry at {}", config.api.base_url).cyan()
    );
    if let Some(user) = session.read().unwrap().user() {
        println!("Session restored for {}", user.email.clone().cyan());
    }
    println!("Type 'help' for commands");

    let history_file = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("patent-cli")
        .join("history");
    let mut line_editor = match FileBackedHistory::with_file(200, history_file) {
        Ok(history) => Reedline::create().with_history(Box::new(history)),
        Err(_) => Reedline::create(),
    };
    let prompt = PatentPrompt {
        session: session.clone(),
    };

    loop {
        match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if !dispatch(trimmed, &rt, &session, &api, &controller)? {
                    break;
                }
            }
            Signal::CtrlD | Signal::CtrlC => {
                println!("\nGoodbye!");
                break;
            }
        }
    }

    Ok(())
}
