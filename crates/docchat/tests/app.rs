use chrono::NaiveDate;
use docchat::command::{Command, parse};
use docchat::config::{Args, Settings};
use docchat::core::prompt::Intent;
use docchat::core::{Gateway, GatewayError, Stage, Workbench};
use docchat::{App, Error, Outcome};
use docchat_test_model::{PresetResponse, TestModelProvider};

fn fixed_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
}

async fn run(app: &mut App, line: &str) -> Result<Outcome, Error> {
    let command = parse(line)?.unwrap();
    app.execute(command).await
}

fn settings(args: &[&str]) -> Settings {
    let args = <Args as clap::Parser>::try_parse_from(
        std::iter::once("docchat").chain(args.iter().copied()),
    )
    .unwrap();
    Settings::resolve(args, |_| None).unwrap()
}

#[tokio::test]
async fn test_upload_generate_ask_export() {
    let dir = tempfile::tempdir().unwrap();
    let drawing = dir.path().join("drawing.png");
    std::fs::write(&drawing, b"\x89PNG fake").unwrap();

    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text("Report text A"));
    provider.add_response(PresetResponse::with_text("Ra 1.6 on the bore."));
    let mut app = App::new(
        Workbench::new("Analysis Report", Intent::GeneralCheck),
        Gateway::new(provider.clone()),
    )
    .with_export_dir(dir.path())
    .with_clock(fixed_day);

    let outcome = run(&mut app, &format!("/upload {}", drawing.display()))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Message("Loaded drawing.png (image, 9 B).".to_owned())
    );

    assert_eq!(
        run(&mut app, "/generate").await.unwrap(),
        Outcome::Reply("Report text A".to_owned())
    );
    assert_eq!(
        run(&mut app, "What surface finish?").await.unwrap(),
        Outcome::Reply("Ra 1.6 on the bore.".to_owned())
    );
    assert_eq!(app.workbench().active().stage(), Stage::Conversing);
    assert_eq!(app.workbench().active().conversation().len(), 3);

    let Outcome::Exported(path) = run(&mut app, "/export txt").await.unwrap()
    else {
        panic!("expected an export");
    };
    assert_eq!(path, dir.path().join("Analysis_Report_2026-10-15.txt"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Report text A");

    let Outcome::Exported(pdf) = run(&mut app, "/export").await.unwrap() else {
        panic!("expected an export");
    };
    assert!(std::fs::read(pdf).unwrap().starts_with(b"%PDF-1.4"));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_errors_keep_the_session_alive() {
    let settings = settings(&[
        "--intent",
        "material-comparison",
        "--tab",
        "Materials",
    ]);
    let mut app = App::from_settings(&settings, Gateway::without_credential());

    let err = run(&mut app, "/generate").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Workflow(docchat::core::Error::MissingParameter { .. })
    ));

    run(&mut app, "/set materials=AISI 304, AISI 316L").await.unwrap();
    let err = run(&mut app, "/generate").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Workflow(docchat::core::Error::Gateway(GatewayError::AuthMissing))
    ));
    assert!(app.workbench().active().conversation().is_empty());

    let err = run(&mut app, "Is 316L worth it?").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Workflow(docchat::core::Error::NoReport)
    ));
    assert!(matches!(
        run(&mut app, "/export").await.unwrap_err(),
        Error::Workflow(docchat::core::Error::NoReport)
    ));
    assert_eq!(
        app.execute(Command::Quit).await.unwrap(),
        Outcome::Quit
    );
}

#[tokio::test]
async fn test_tabs_from_the_command_line() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text("First question?"));
    let settings = settings(&["--param", "company=ACME"]);
    let mut app = App::from_settings(&settings, Gateway::new(provider));

    run(&mut app, "/tab interview interview-rehearsal").await.unwrap();
    run(&mut app, "/set company=ACME").await.unwrap();
    run(&mut app, "/set position=Intern").await.unwrap();
    run(&mut app, "/generate").await.unwrap();

    run(&mut app, "/tab Analysis Report").await.unwrap();
    let Outcome::Message(listing) = run(&mut app, "/tabs").await.unwrap() else {
        panic!("expected a listing");
    };
    assert_eq!(
        listing,
        "* Analysis Report (general-check, empty, 0 turn(s))\n  \
         interview (interview-rehearsal, report generated, 1 turn(s))\n"
    );
    let first = &app.workbench().tabs()[0];
    assert!(first.conversation().is_empty());
    assert_eq!(first.params()["company"], "ACME");
}

#[tokio::test]
async fn test_reopening_a_tab_reports_its_kept_intent() {
    let settings = settings(&[]);
    let mut app =
        App::from_settings(&settings, Gateway::new(TestModelProvider::default()));

    run(&mut app, "/tab Materials material-comparison").await.unwrap();
    run(&mut app, "/tab Other").await.unwrap();

    let Outcome::Message(text) =
        run(&mut app, "/tab Materials machinist").await.unwrap()
    else {
        panic!("expected a message");
    };
    assert!(text.starts_with(
        "Tab `Materials` already exists and keeps its intent \
         `material-comparison`, use /intent machinist to change it.\n"
    ));
    assert_eq!(app.workbench().active().intent(), Intent::MaterialComparison);

    let Outcome::Message(text) =
        run(&mut app, "/tab Materials material-comparison").await.unwrap()
    else {
        panic!("expected a message");
    };
    assert!(!text.contains("already exists"));
}
