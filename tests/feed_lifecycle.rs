//! Integration tests for the command surface: register, log in, add and
//! follow feeds, reset.
//!
//! Each test creates its own in-memory SQLite database and config file.
//! Commands run through `dispatch` exactly as the binary runs them, with
//! output captured in a buffer.

use gator::commands::{dispatch, Command, State};
use gator::config::Config;
use gator::storage::Database;
use pretty_assertions::assert_eq;

async fn test_state(name: &str) -> State {
    let dir = std::env::temp_dir().join(format!("gator_lifecycle_{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    State {
        db: Database::open(":memory:").await.unwrap(),
        config: Config::default(),
        config_path: dir.join("gatorconfig.json"),
    }
}

fn cleanup(state: &State) {
    if let Some(dir) = state.config_path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

/// Run a command and return what it printed.
async fn run(state: &mut State, command: Command) -> anyhow::Result<String> {
    let mut out = Vec::new();
    dispatch(state, command, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

fn register(name: &str) -> Command {
    Command::Register { name: name.into() }
}

fn addfeed(name: &str, url: &str) -> Command {
    Command::Addfeed {
        name: name.into(),
        url: url.into(),
    }
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_register_logs_in_and_persists() {
    let mut state = test_state("register").await;

    let out = run(&mut state, register("kahya")).await.unwrap();
    assert!(out.starts_with("User kahya was created"), "got {}", out);
    assert_eq!(state.config.current_user_name.as_deref(), Some("kahya"));

    let on_disk = Config::load(&state.config_path).unwrap();
    assert_eq!(on_disk.current_user_name.as_deref(), Some("kahya"));

    cleanup(&state);
}

#[tokio::test]
async fn test_register_duplicate_fails() {
    let mut state = test_state("register_dup").await;

    run(&mut state, register("kahya")).await.unwrap();
    let err = run(&mut state, register("kahya")).await.unwrap_err();
    assert!(format!("{:#}", err).contains("already exists"), "got {:#}", err);

    cleanup(&state);
}

#[tokio::test]
async fn test_login_switches_user() {
    let mut state = test_state("login").await;

    run(&mut state, register("kahya")).await.unwrap();
    run(&mut state, register("holgith")).await.unwrap();
    assert_eq!(state.config.current_user_name.as_deref(), Some("holgith"));

    let out = run(&mut state, Command::Login { name: "kahya".into() })
        .await
        .unwrap();
    assert_eq!(out, "Logged in as kahya\n");
    assert_eq!(state.config.current_user_name.as_deref(), Some("kahya"));

    cleanup(&state);
}

#[tokio::test]
async fn test_login_unknown_user_fails_without_changing_config() {
    let mut state = test_state("login_unknown").await;

    run(&mut state, register("kahya")).await.unwrap();
    let err = run(&mut state, Command::Login { name: "nobody".into() })
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("does not exist"));
    assert_eq!(state.config.current_user_name.as_deref(), Some("kahya"));

    cleanup(&state);
}

#[tokio::test]
async fn test_users_marks_current() {
    let mut state = test_state("users").await;

    run(&mut state, register("kahya")).await.unwrap();
    run(&mut state, register("holgith")).await.unwrap();

    let out = run(&mut state, Command::Users).await.unwrap();
    assert_eq!(out, " * kahya\n * holgith (current)\n");

    cleanup(&state);
}

#[tokio::test]
async fn test_empty_listings_are_not_errors() {
    let mut state = test_state("empty_listings").await;

    let out = run(&mut state, Command::Users).await.unwrap();
    assert_eq!(out, "No users registered yet\n");

    let out = run(&mut state, Command::Feeds).await.unwrap();
    assert_eq!(out, "No feeds yet\n");

    cleanup(&state);
}

#[tokio::test]
async fn test_reset_removes_everything() {
    let mut state = test_state("reset").await;

    run(&mut state, register("kahya")).await.unwrap();
    run(&mut state, addfeed("Lanes", "https://wagslane.dev/index.xml"))
        .await
        .unwrap();

    let out = run(&mut state, Command::Reset).await.unwrap();
    assert_eq!(out, "Removed 1 users and all their feeds\n");

    assert!(state.db.get_users().await.unwrap().is_empty());
    assert!(state.db.get_feeds().await.unwrap().is_empty());

    // The configured user is gone, so user-scoped commands now fail
    let err = run(&mut state, Command::Following).await.unwrap_err();
    assert!(format!("{:#}", err).contains("not registered"), "got {:#}", err);

    cleanup(&state);
}

// ============================================================================
// Feeds and follows
// ============================================================================

#[tokio::test]
async fn test_feed_commands_require_login() {
    let mut state = test_state("no_login").await;

    let err = run(&mut state, addfeed("Lanes", "https://wagslane.dev/index.xml"))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("No user logged in"));
    assert!(state.db.get_feeds().await.unwrap().is_empty());

    cleanup(&state);
}

#[tokio::test]
async fn test_addfeed_follows_automatically() {
    let mut state = test_state("addfeed").await;

    run(&mut state, register("kahya")).await.unwrap();
    let out = run(&mut state, addfeed("Lanes", "https://wagslane.dev/index.xml"))
        .await
        .unwrap();
    assert!(out.starts_with("Feed added and followed by kahya"), "got {}", out);
    assert!(out.contains("URL: https://wagslane.dev/index.xml"));

    let out = run(&mut state, Command::Following).await.unwrap();
    assert_eq!(out, "Current user: kahya\n * Lanes\n");

    cleanup(&state);
}

#[tokio::test]
async fn test_addfeed_rejects_bad_url() {
    let mut state = test_state("addfeed_bad").await;

    run(&mut state, register("kahya")).await.unwrap();
    let err = run(&mut state, addfeed("Local", "file:///etc/passwd"))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("not a feed URL"));
    assert!(state.db.get_feeds().await.unwrap().is_empty());

    cleanup(&state);
}

#[tokio::test]
async fn test_addfeed_duplicate_url_fails() {
    let mut state = test_state("addfeed_dup").await;

    run(&mut state, register("kahya")).await.unwrap();
    run(&mut state, addfeed("Lanes", "https://wagslane.dev/index.xml"))
        .await
        .unwrap();

    run(&mut state, register("holgith")).await.unwrap();
    let err = run(&mut state, addfeed("Again", "https://wagslane.dev/index.xml"))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("already exists"));

    cleanup(&state);
}

#[tokio::test]
async fn test_feeds_lists_owner() {
    let mut state = test_state("feeds").await;

    run(&mut state, register("kahya")).await.unwrap();
    run(&mut state, addfeed("Lanes", "https://wagslane.dev/index.xml"))
        .await
        .unwrap();
    run(&mut state, register("holgith")).await.unwrap();
    run(&mut state, addfeed("HN", "https://news.ycombinator.com/rss"))
        .await
        .unwrap();

    let out = run(&mut state, Command::Feeds).await.unwrap();
    assert_eq!(
        out,
        "\nName: Lanes\nURL: https://wagslane.dev/index.xml\nAdded by: kahya\n\
         \nName: HN\nURL: https://news.ycombinator.com/rss\nAdded by: holgith\n"
    );

    cleanup(&state);
}

#[tokio::test]
async fn test_follow_and_unfollow_other_users_feed() {
    let mut state = test_state("follow").await;

    run(&mut state, register("kahya")).await.unwrap();
    run(&mut state, addfeed("Lanes", "https://wagslane.dev/index.xml"))
        .await
        .unwrap();

    run(&mut state, register("holgith")).await.unwrap();
    let out = run(
        &mut state,
        Command::Follow {
            url: "https://wagslane.dev/index.xml".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Feed: Lanes\nUser: holgith\n");

    let err = run(
        &mut state,
        Command::Follow {
            url: "https://wagslane.dev/index.xml".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(format!("{:#}", err).contains("already follows"));

    let out = run(
        &mut state,
        Command::Unfollow {
            url: "https://wagslane.dev/index.xml".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "holgith unfollowed Lanes\n");

    let out = run(&mut state, Command::Following).await.unwrap();
    assert_eq!(out, "Current user: holgith\nNot following any feeds\n");

    // The owner still follows it
    let kahya = state.db.get_user("kahya").await.unwrap();
    let follows = state.db.get_feed_follows_for_user(kahya.id).await.unwrap();
    assert_eq!(follows.len(), 1);

    cleanup(&state);
}

#[tokio::test]
async fn test_unfollow_when_not_following_fails() {
    let mut state = test_state("unfollow_missing").await;

    run(&mut state, register("kahya")).await.unwrap();
    run(&mut state, addfeed("Lanes", "https://wagslane.dev/index.xml"))
        .await
        .unwrap();
    run(&mut state, register("holgith")).await.unwrap();

    let err = run(
        &mut state,
        Command::Unfollow {
            url: "https://wagslane.dev/index.xml".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(format!("{:#}", err).contains("not found"), "got {:#}", err);

    cleanup(&state);
}

#[tokio::test]
async fn test_follow_unknown_feed_fails() {
    let mut state = test_state("follow_unknown").await;

    run(&mut state, register("kahya")).await.unwrap();
    let err = run(
        &mut state,
        Command::Follow {
            url: "https://example.com/missing.xml".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(format!("{:#}", err).contains("not found"), "got {:#}", err);

    cleanup(&state);
}
