use std::process::ExitCode;

use wordbook_cache::logging;
use wordbook_cache::models::{DisplayMode, Word};
use wordbook_cache::preferences::{FileStorage, LocalStorage, MemoryStorage, Preferences};
use wordbook_cache::{ClientConfig, HttpGateway, NotebookCache, RemoteResult, SessionGuard};

const USAGE: &str = "usage: wordbook-cli <wordbooks | chapters WORDBOOK_ID | tags | words CHAPTER_ID [--tag TAG_ID]... [--shuffle] [--mode original|translation|bilingual]>";

enum Command {
    Wordbooks,
    Chapters(i32),
    Tags,
    Words {
        chapter_id: i32,
        tags: Vec<i32>,
        shuffle: bool,
        mode: DisplayMode,
    },
}

fn parse_args(args: &[String]) -> Option<Command> {
    let (name, rest) = args.split_first()?;
    match name.as_str() {
        "wordbooks" => Some(Command::Wordbooks),
        "tags" => Some(Command::Tags),
        "chapters" => Some(Command::Chapters(rest.first()?.parse().ok()?)),
        "words" => {
            let (chapter, flags) = rest.split_first()?;
            let chapter_id = chapter.parse().ok()?;
            let mut tags = Vec::new();
            let mut shuffle = false;
            let mut mode = DisplayMode::default();
            let mut iter = flags.iter();
            while let Some(flag) = iter.next() {
                match flag.as_str() {
                    "--tag" => tags.push(iter.next()?.parse().ok()?),
                    "--shuffle" => shuffle = true,
                    "--mode" => mode = DisplayMode::parse(iter.next()?)?,
                    _ => return None,
                }
            }
            Some(Command::Words {
                chapter_id,
                tags,
                shuffle,
                mode,
            })
        }
        _ => None,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = ClientConfig::from_env();
    let _log_guard = logging::init_tracing(&config.log_level);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let gateway = HttpGateway::new(&config);
    let session = SessionGuard::new(gateway.clone());
    if let Err(err) = sign_in(&session).await {
        eprintln!("sign-in failed: {err}");
        return ExitCode::FAILURE;
    }

    let cache = NotebookCache::new(gateway);
    let result = match config.preferences_path.as_deref() {
        Some(path) => run(&cache, command, Preferences::load(FileStorage::open(path))).await,
        None => run(&cache, command, Preferences::load(MemoryStorage::new())).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(kind = %err.kind, status = ?err.status_code, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Uses `WORDBOOK_USERNAME`/`WORDBOOK_PASSWORD` when set, otherwise relies
/// on whatever session the service already recognises.
async fn sign_in(session: &SessionGuard<HttpGateway>) -> RemoteResult<()> {
    let username = std::env::var("WORDBOOK_USERNAME").ok();
    let password = std::env::var("WORDBOOK_PASSWORD").ok();
    match (username, password) {
        (Some(username), Some(password)) => session.login(&username, &password).await.map(|_| ()),
        _ => {
            if session.check_auth().await.is_none() {
                tracing::warn!("no session, requests will likely be rejected");
            }
            Ok(())
        }
    }
}

async fn run<S: LocalStorage>(
    cache: &NotebookCache<HttpGateway>,
    command: Command,
    prefs: Preferences<S>,
) -> RemoteResult<()> {
    match command {
        Command::Wordbooks => {
            for wb in cache.list_wordbooks().await? {
                println!("{:>5}  {}  {}", wb.id, wb.name, wb.description.unwrap_or_default());
            }
        }
        Command::Chapters(wordbook_id) => {
            for chapter in cache.list_chapters(wordbook_id).await? {
                println!("{:>5}  [{}] {}", chapter.id, chapter.sort_order, chapter.name);
            }
        }
        Command::Tags => {
            for tag in cache.list_tags().await? {
                println!("{:>5}  {}  {}", tag.id, tag.name, tag.color.unwrap_or_default());
            }
        }
        Command::Words {
            chapter_id,
            tags,
            shuffle,
            mode,
        } => {
            cache.list_words(chapter_id).await?;
            for tag_id in tags {
                cache.toggle_tag_filter(tag_id);
            }
            if shuffle {
                cache.shuffle_words(chapter_id);
            }
            cache.set_display_mode(mode);

            let gap = " ".repeat((prefs.word_gap() / 8.0).max(1.0) as usize);
            for word in cache.filtered_words(chapter_id) {
                println!("{}", render_word(&word, cache.display_mode(), &gap));
            }
        }
    }
    Ok(())
}

fn render_word(word: &Word, mode: DisplayMode, gap: &str) -> String {
    match mode {
        DisplayMode::Original => word.source.clone(),
        DisplayMode::Translation => word.translation.clone(),
        DisplayMode::Bilingual => format!("{}{gap}{}", word.source, word.translation),
    }
}
