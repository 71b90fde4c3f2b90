use mangaverse_client::models::favorites::ToggleFavorite;
use mangaverse_client::models::media::MediaKind;
use mangaverse_client::services::favorites::ToggleResult;
use mangaverse_client::utils::display::DisplayFormatter;
use mangaverse_client::validation::{classify_email, classify_password, classify_username};
use mangaverse_client::{CatalogService, FavoritesService};
use std::error::Error;
use std::io::{self, Write};
use tracing::{debug, info};

const FAVORITES_BASE_URL: &str = "http://localhost:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing with debug level
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting MangaVerse catalog client");

    let catalog = CatalogService::new();
    let favorites = FavoritesService::new(FAVORITES_BASE_URL);
    let display = DisplayFormatter::new();

    println!("=== MangaVerse Catalog Client ===");
    println!("Commands:");
    println!("  top <anime|manga>            - Show the top list");
    println!("  latest                       - Show recently started manga");
    println!("  search <anime|manga> <text>  - Search the catalog");
    println!("  season [upcoming]            - Current or upcoming anime season");
    println!("  fav <anime|manga> <id>       - Toggle a favorite");
    println!("  unfav <anime|manga> <id>     - Remove a favorite");
    println!("  favs                         - Show locally known favorites");
    println!("  signup <user> <email> <pass> - Validate signup fields");
    println!("  exit                         - Exit the program");

    let mut input = String::new();
    loop {
        input.clear();
        print!("> ");
        io::stdout().flush()?;
        io::stdin().read_line(&mut input)?;

        let command = input.trim();
        let mut parts = command.split_whitespace();
        match parts.next() {
            None => continue,
            Some("exit") => {
                debug!("Received exit command");
                break;
            }
            Some("top") => match parse_kind(parts.next()) {
                Some(kind) => catalog.fetch_and_display_top(kind, 12).await,
                None => println!("Usage: top <anime|manga>"),
            },
            Some("latest") => catalog.fetch_and_display_latest_manga(12).await,
            Some("search") => {
                let kind = parse_kind(parts.next());
                let query = parts.collect::<Vec<_>>().join(" ");
                match kind {
                    Some(kind) if !query.is_empty() => {
                        catalog.fetch_and_display_search(kind, &query, 12).await
                    }
                    _ => println!("Usage: search <anime|manga> <text>"),
                }
            }
            Some("season") => {
                let upcoming = parts.next() == Some("upcoming");
                catalog.fetch_and_display_season(upcoming, 12).await
            }
            Some("fav") => {
                let kind = parse_kind(parts.next());
                let id = parts.next().and_then(|raw| raw.parse::<u64>().ok());
                match (kind, id) {
                    (Some(kind), Some(id)) => {
                        debug!("Toggling favorite {} {}", kind, id);
                        match catalog.details(kind, id).await {
                            Some(summary) => {
                                println!("{}", display.format_media_summary(&summary));
                                let request = ToggleFavorite::from_summary(&summary);
                                match favorites.toggle(&request).await {
                                    Ok(ToggleResult::Backend { is_favorite: true }) => println!(
                                        "{}",
                                        display.format_notice("Added to favorites", true)
                                    ),
                                    Ok(ToggleResult::Backend { is_favorite: false }) => println!(
                                        "{}",
                                        display.format_notice("Removed from favorites", true)
                                    ),
                                    Ok(ToggleResult::Local { is_favorite }) => {
                                        let notice = if is_favorite {
                                            "Added to favorites (local only)"
                                        } else {
                                            "Removed from favorites (local only)"
                                        };
                                        println!("{}", display.format_notice(notice, true));
                                    }
                                    Err(err) => println!(
                                        "{}",
                                        display.format_notice(
                                            &format!("Favorite toggle failed: {}", err),
                                            false
                                        )
                                    ),
                                }
                            }
                            None => println!("{}", display.format_notice("Entry not found", false)),
                        }
                    }
                    _ => println!("Usage: fav <anime|manga> <id>"),
                }
            }
            Some("unfav") => {
                let kind = parse_kind(parts.next());
                let id = parts.next().and_then(|raw| raw.parse::<u64>().ok());
                match (kind, id) {
                    (Some(kind), Some(id)) => match favorites.remove(id, kind).await {
                        Ok(()) => {
                            println!("{}", display.format_notice("Removed from favorites", true))
                        }
                        Err(err) => println!(
                            "{}",
                            display.format_notice(&format!("Remove failed: {}", err), false)
                        ),
                    },
                    _ => println!("Usage: unfav <anime|manga> <id>"),
                }
            }
            Some("favs") => {
                println!(
                    "{}",
                    display.format_favorites_table(&favorites.local_favorites())
                );
            }
            Some("signup") => {
                let username = parts.next().unwrap_or("");
                let email = parts.next().unwrap_or("");
                let password = parts.next().unwrap_or("");
                report_field(&display, "username", classify_username(username));
                report_field(&display, "email", classify_email(email));
                report_field(&display, "password", classify_password(password));
            }
            Some(other) => println!("Unknown command: {}", other),
        }
    }

    info!("Shutting down");
    Ok(())
}

fn parse_kind(arg: Option<&str>) -> Option<MediaKind> {
    match arg {
        Some("anime") => Some(MediaKind::Anime),
        Some("manga") => Some(MediaKind::Manga),
        _ => None,
    }
}

fn report_field(display: &DisplayFormatter, field: &str, reason: Option<&'static str>) {
    match reason {
        Some(reason) => println!(
            "{}",
            display.format_notice(&format!("{}: {}", field, reason), false)
        ),
        None => println!("{}", display.format_notice(&format!("{}: ok", field), true)),
    }
}
