use smellsplit_core::checkout::GitCheckout;
use smellsplit_core::config::SplitConfig;
use smellsplit_core::pipeline::{DatasetPipeline, Stage};
use smellsplit_core::progress::NoopReporter;
use smellsplit_core::repository::WorkspaceLayout;
use smellsplit_test::{LabelFixture, OriginRepo, SourceDecomposer, bucket};

const T1: &str = "2020-01-01T10:00:00+00:00";
const T2: &str = "2020-06-01T10:00:00+00:00";
const T3: &str = "2021-01-01T10:00:00+00:00";

const PARSER: &str = "class Parser {\n    void parse() { int x = 42; }\n    void peek() {}\n}\n";
const LEXER: &str = "class Lexer {\n    void next() {}\n}\n";
const WINDOW: &str = "class Window {\n    void draw() {}\n}\n";

fn widgets() -> OriginRepo {
    OriginRepo::single(
        T1,
        &[
            ("core/Parser.java", PARSER),
            ("core/Lexer.java", LEXER),
            ("ui/Window.java", WINDOW),
        ],
    )
}

// ── Full pipeline ────────────────────────────────────────────────

#[tokio::test]
async fn builds_positive_and_negative_buckets() {
    let origin = widgets();
    let store = LabelFixture::new()
        .solution("sol-w", "widgets", &origin.link(), "2020-02-01 00:00:00")
        .design("sol-w", "Multifaceted Abstraction", "core", "Parser")
        .implementation("sol-w", "Magic Number", "core", "Parser", "parse")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let layout = WorkspaceLayout::new(work.path());
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(&config, layout, &store, &GitCheckout, &decomposer);

    let result = pipeline.run(0, 10).await.unwrap();
    assert_eq!(result.attempted, 1);
    assert!(
        result.failures.is_empty(),
        "unexpected failures: {:?}",
        result.failures
    );
    assert_eq!(result.succeeded, vec!["sol-w"]);

    let root = work.path();
    assert_eq!(
        bucket(root, "Multifaceted Abstraction", "positive"),
        vec!["sol-w_core_Parser.code"]
    );
    assert_eq!(
        bucket(root, "Multifaceted Abstraction", "negative"),
        vec!["sol-w_core_Lexer.code", "sol-w_ui_Window.code"]
    );
    assert_eq!(
        bucket(root, "Magic Number", "positive"),
        vec!["sol-w_core_Parser_parse.code"]
    );
    assert_eq!(
        bucket(root, "Magic Number", "negative"),
        vec![
            "sol-w_core_Lexer_next.code",
            "sol-w_core_Parser_peek.code",
            "sol-w_ui_Window_draw.code"
        ]
    );

    // Smells without any labels still get a complete negative bucket.
    assert!(bucket(root, "Complex Method", "positive").is_empty());
    assert_eq!(bucket(root, "Complex Method", "negative").len(), 4);
    assert_eq!(bucket(root, "Empty catch clause", "negative").len(), 4);

    let magic = result.smells["Magic Number"];
    assert_eq!((magic.positive, magic.negative), (1, 3));
}

#[tokio::test]
async fn successful_repositories_are_cleaned_up() {
    let origin = widgets();
    let store = LabelFixture::new()
        .solution("sol-w", "widgets", &origin.link(), "2020-02-01 00:00:00")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );
    pipeline.run(0, 10).await.unwrap();

    let layout = pipeline.layout();
    assert!(!layout.repos.join("sol-w").exists());
    assert!(!layout.classes.join("sol-w").exists());
    assert!(!layout.methods.join("sol-w").exists());
    assert!(layout.repos.is_dir(), "scratch root stays in place");
}

// ── Revision pinning ─────────────────────────────────────────────

#[tokio::test]
async fn units_come_from_the_analysed_revision() {
    let origin = OriginRepo::with_history(&[
        (T1, &[("core/Parser.java", "class Parser {\n    void parse() {}\n}\n")]),
        (T2, &[("core/Parser.java", PARSER)]),
        (T3, &[("core/Lexer.java", LEXER)]),
    ]);
    // One hour after T2: peek exists, Lexer does not yet.
    let store = LabelFixture::new()
        .solution("sol-p", "pinned", &origin.link(), "2020-06-01 11:00:00")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );
    let result = pipeline.run(0, 10).await.unwrap();
    assert!(result.failures.is_empty(), "{:?}", result.failures);

    assert_eq!(
        bucket(work.path(), "Complex Method", "negative"),
        vec!["sol-p_core_Parser_parse.code", "sol-p_core_Parser_peek.code"]
    );
    assert_eq!(
        bucket(work.path(), "Multifaceted Abstraction", "negative"),
        vec!["sol-p_core_Parser.code"]
    );
}

#[tokio::test]
async fn repository_newer_than_analysis_is_skipped() {
    let origin = OriginRepo::single(T3, &[("core/Parser.java", PARSER)]);
    let store = LabelFixture::new()
        .solution("sol-late", "late", &origin.link(), "2020-01-01 00:00:00")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );
    let result = pipeline.run(0, 10).await.unwrap();
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].stage, Stage::Checkout);
}

// ── Failure isolation ────────────────────────────────────────────

#[tokio::test]
async fn failed_checkout_does_not_stop_the_batch() {
    let first = widgets();
    let third = widgets();
    let missing = tempfile::tempdir().unwrap();
    // Names order the batch: "c" first, "a" last.
    let store = LabelFixture::new()
        .solution("sol-1", "c-first", &first.link(), "2020-02-01 00:00:00")
        .solution(
            "sol-2",
            "b-broken",
            &missing.path().join("gone.git").to_string_lossy(),
            "2020-02-01 00:00:00",
        )
        .solution("sol-3", "a-third", &third.link(), "2020-02-01 00:00:00")
        .design("sol-1", "Multifaceted Abstraction", "core", "Parser")
        .design("sol-3", "Multifaceted Abstraction", "ui", "Window")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );
    let result = pipeline.run(0, 10).await.unwrap();

    assert_eq!(result.attempted, 3);
    assert_eq!(result.succeeded, vec!["sol-1", "sol-3"]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].solution_id, "sol-2");
    assert_eq!(result.failures[0].stage, Stage::Checkout);

    assert_eq!(
        bucket(work.path(), "Multifaceted Abstraction", "positive"),
        vec!["sol-1_core_Parser.code", "sol-3_ui_Window.code"]
    );
    let negatives = bucket(work.path(), "Multifaceted Abstraction", "negative");
    assert!(negatives.iter().all(|n| !n.starts_with("sol-2_")));
    assert_eq!(negatives.len(), 4);
}

#[tokio::test]
async fn decomposition_failure_leaves_checkout_for_inspection() {
    let good = widgets();
    let bad = widgets();
    let store = LabelFixture::new()
        .solution("sol-good", "good", &good.link(), "2020-02-01 00:00:00")
        .solution("sol-bad", "bad", &bad.link(), "2020-02-01 00:00:00")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new().failing_for("sol-bad");
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );
    let result = pipeline.run(0, 10).await.unwrap();

    assert_eq!(result.succeeded, vec!["sol-good"]);
    assert_eq!(result.failures[0].stage, Stage::DecomposeClasses);
    assert!(pipeline.layout().repos.join("sol-bad").join("core").is_dir());
    assert!(!pipeline.layout().repos.join("sol-good").exists());
}

#[tokio::test]
async fn inconsistent_labels_skip_repository_before_copying() {
    let good = widgets();
    let mixed = widgets();
    let store = LabelFixture::new()
        .solution("sol-good", "good", &good.link(), "2020-02-01 00:00:00")
        .solution("sol-mixed", "mixed", &mixed.link(), "2020-02-01 00:00:00")
        .design("sol-mixed", "Complex Method", "core", "Parser")
        .implementation("sol-mixed", "Complex Method", "core", "Parser", "parse")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );
    let result = pipeline.run(0, 10).await.unwrap();

    assert_eq!(result.succeeded, vec!["sol-good"]);
    assert_eq!(result.failures[0].stage, Stage::Labels);
    for smell in &config.smells {
        for side in ["positive", "negative"] {
            assert!(
                bucket(work.path(), &smell.name, side)
                    .iter()
                    .all(|n| !n.starts_with("sol-mixed_")),
                "{} {side} holds units of a rejected repository",
                smell.name
            );
        }
    }
}

#[tokio::test]
async fn labels_of_the_wrong_kind_are_rejected() {
    let origin = widgets();
    let store = LabelFixture::new()
        .solution("sol-w", "widgets", &origin.link(), "2020-02-01 00:00:00")
        .implementation("sol-w", "Multifaceted Abstraction", "core", "Parser", "parse")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );
    let result = pipeline.run(0, 10).await.unwrap();
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].stage, Stage::Labels);
}

// ── Naming ───────────────────────────────────────────────────────

#[tokio::test]
async fn same_class_in_two_repositories_gives_two_files() {
    let first = widgets();
    let second = widgets();
    let store = LabelFixture::new()
        .solution("sol-a", "same", &first.link(), "2020-02-01 00:00:00")
        .solution("sol-b", "same", &second.link(), "2020-02-01 00:00:00")
        .design("sol-a", "Multifaceted Abstraction", "core", "Parser")
        .design("sol-b", "Multifaceted Abstraction", "core", "Parser")
        .into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );
    let result = pipeline.run(0, 10).await.unwrap();
    assert!(result.failures.is_empty(), "{:?}", result.failures);

    assert_eq!(
        bucket(work.path(), "Multifaceted Abstraction", "positive"),
        vec!["sol-a_core_Parser.code", "sol-b_core_Parser.code"]
    );
}

// ── Pagination ───────────────────────────────────────────────────

#[tokio::test]
async fn pages_select_disjoint_repositories() {
    let repos: Vec<_> = (0..3).map(|_| widgets()).collect();
    let mut fixture = LabelFixture::new();
    for (i, origin) in repos.iter().enumerate() {
        fixture = fixture.solution(
            &format!("sol-{i}"),
            &format!("repo-{i}"),
            &origin.link(),
            "2020-02-01 00:00:00",
        );
    }
    let store = fixture.into_store();

    let work = tempfile::tempdir().unwrap();
    let config = SplitConfig::default();
    let decomposer = SourceDecomposer::new();
    let pipeline = DatasetPipeline::new(
        &config,
        WorkspaceLayout::new(work.path()),
        &store,
        &GitCheckout,
        &decomposer,
    );

    let first = pipeline.run(0, 2).await.unwrap();
    assert_eq!(first.succeeded, vec!["sol-2", "sol-1"]);
    let second = pipeline
        .run_with_progress(2, 2, &NoopReporter)
        .await
        .unwrap();
    assert_eq!(second.succeeded, vec!["sol-0"]);

    // Buckets accumulate across runs; scratch folders do not.
    assert_eq!(
        bucket(work.path(), "Multifaceted Abstraction", "negative").len(),
        9
    );
}
