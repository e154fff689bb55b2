//! End-to-end pipeline tests: CSV corpus -> embedding cache -> ranked hits.

use crate::common::{SAMPLE_CSV, TestWorkspace, default_generator};
use labelseek::io::ExitCode;
use labelseek::semantic::CacheSource;
use labelseek::session::{self, SessionOptions};
use labelseek::{DomainSubset, EmbeddingGenerator, SearchError, SearchOptions, open_session};
use std::sync::Arc;

fn no_progress() -> impl FnMut(usize, usize) {
    |_, _| {}
}

#[test]
fn test_cold_and_warm_cache_give_identical_scores() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let corpus = session::load_corpus(&settings).unwrap();
    assert_eq!(corpus.len(), 7, "blank label row must be dropped");

    let cache = session::cache_for(&settings);
    let generator = Arc::new(default_generator());
    let options = SessionOptions::default();
    let query = SearchOptions::default();

    let cold = open_session(&cache, &corpus, generator.clone(), &options, &mut no_progress())
        .unwrap();
    assert_eq!(cold.source, CacheSource::Built);
    let cold_hits = cold.search.search("sleep", &query).unwrap();
    let calls_after_cold = generator.calls();

    let warm = open_session(&cache, &corpus, generator.clone(), &options, &mut no_progress())
        .unwrap();
    assert_eq!(warm.source, CacheSource::Loaded);
    let warm_hits = warm.search.search("sleep", &query).unwrap();

    // Only the query was embedded on the warm run
    assert_eq!(generator.calls(), calls_after_cold + 1);

    assert_eq!(cold_hits.len(), warm_hits.len());
    for (a, b) in cold_hits.iter().zip(&warm_hits) {
        assert_eq!(a.row, b.row);
        assert!((a.score - b.score).abs() < 1e-6);
    }
}

#[test]
fn test_hits_are_sorted_subset_above_cutoff() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let corpus = session::load_corpus(&settings).unwrap();
    let session = open_session(
        &session::cache_for(&settings),
        &corpus,
        Arc::new(default_generator()),
        &SessionOptions::default(),
        &mut no_progress(),
    )
    .unwrap();

    for cutoff in [-1.0, 0.0, 0.2, 0.5, 0.9] {
        let options = SearchOptions::default().with_cutoff(cutoff);
        let hits = session.search.search("trouble to sleep", &options).unwrap();

        assert!(hits.iter().all(|hit| hit.score > cutoff));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        for hit in &hits {
            let row = corpus.get(hit.row).unwrap();
            assert_eq!(row.label, hit.label);
            assert_eq!(row.domain, hit.domain);
        }
    }

    let hits = session
        .search
        .search("sleep", &SearchOptions::default())
        .unwrap();
    let labels: Vec<&str> = hits.iter().map(|hit| hit.label.as_str()).collect();
    assert_eq!(labels.len(), 3);
    assert_eq!(labels[0], "Hours of sleep per night");
    assert!(labels.contains(&"Difficulty falling asleep"));
    assert!(labels.contains(&"Sleep related brain activity"));
}

#[test]
fn test_domain_filter_never_leaks() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let corpus = session::load_corpus(&settings).unwrap();
    let session = open_session(
        &session::cache_for(&settings),
        &corpus,
        Arc::new(default_generator()),
        &SessionOptions::default(),
        &mut no_progress(),
    )
    .unwrap();

    let imaging = SearchOptions::default().with_domains(["imaging"]);
    let hits = session.search.search("sleep", &imaging).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].label, "Sleep related brain activity");

    let everything = SearchOptions::default()
        .with_cutoff(-1.0)
        .with_domains(["lifestyle", "socioeconomic"]);
    let hits = session.search.search("income", &everything).unwrap();
    assert_eq!(hits.len(), 5);
    assert!(hits.iter().all(|hit| hit.domain != "imaging"));
}

#[test]
fn test_blank_query_does_not_call_model() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let corpus = session::load_corpus(&settings).unwrap();
    let generator = Arc::new(default_generator());
    let session = open_session(
        &session::cache_for(&settings),
        &corpus,
        generator.clone(),
        &SessionOptions::default(),
        &mut no_progress(),
    )
    .unwrap();
    let calls = generator.calls();

    for query in ["", " ", "\n\t "] {
        let hits = session
            .search
            .search(query, &SearchOptions::default())
            .unwrap();
        assert!(hits.is_empty());
    }
    assert_eq!(generator.calls(), calls);
}

#[test]
fn test_grown_corpus_is_a_cache_mismatch() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let cache = session::cache_for(&settings);
    let generator = Arc::new(default_generator());

    let corpus = session::load_corpus(&settings).unwrap();
    open_session(&cache, &corpus, generator.clone(), &SessionOptions::default(), &mut no_progress())
        .unwrap();

    workspace.write(
        "data/labels.csv",
        &format!("{SAMPLE_CSV}Caffeine before bed,lifestyle,q7\n"),
    );
    let grown = session::load_corpus(&settings).unwrap();
    assert_eq!(grown.len(), 8);

    let err = open_session(&cache, &grown, generator, &SessionOptions::default(), &mut no_progress())
        .unwrap_err();
    match &err {
        SearchError::CacheMismatch {
            cache_rows,
            corpus_rows,
            ..
        } => {
            assert_eq!(*cache_rows, 7);
            assert_eq!(*corpus_rows, 8);
        }
        other => panic!("Expected CacheMismatch, got {other:?}"),
    }
    assert_eq!(ExitCode::from_error(&err), ExitCode::CacheCorrupted);
}

#[test]
fn test_edited_label_is_stale_until_rebuilt() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let cache = session::cache_for(&settings);
    let generator = Arc::new(default_generator());

    let corpus = session::load_corpus(&settings).unwrap();
    open_session(&cache, &corpus, generator.clone(), &SessionOptions::default(), &mut no_progress())
        .unwrap();

    workspace.write(
        "data/labels.csv",
        &SAMPLE_CSV.replace("Alcohol units per week", "Alcohol units per day"),
    );
    let edited = session::load_corpus(&settings).unwrap();

    let err = open_session(
        &cache,
        &edited,
        generator.clone(),
        &SessionOptions::default(),
        &mut no_progress(),
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::CacheStale { .. }));

    let rebuild = SessionOptions {
        force_rebuild: true,
        ..SessionOptions::default()
    };
    let session = open_session(&cache, &edited, generator, &rebuild, &mut no_progress()).unwrap();
    assert_eq!(session.source, CacheSource::Built);
}

#[test]
fn test_excluded_domain_has_its_own_cache() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let cache = session::cache_for(&settings);
    let corpus = session::load_corpus(&settings).unwrap();
    let generator = Arc::new(default_generator());

    let all = open_session(&cache, &corpus, generator.clone(), &SessionOptions::default(), &mut no_progress())
        .unwrap();
    let without_imaging = SessionOptions {
        subset: DomainSubset::excluding(["imaging"]),
        force_rebuild: false,
    };
    let partial = open_session(&cache, &corpus, generator.clone(), &without_imaging, &mut no_progress())
        .unwrap();

    assert_ne!(all.cache_path, partial.cache_path);
    assert!(all.cache_path.exists());
    assert!(partial.cache_path.exists());
    assert_eq!(partial.search.corpus().len(), 5);
    assert_eq!(partial.metadata.excluded_domains, vec!["imaging".to_string()]);

    let hits = partial
        .search
        .search("brain", &SearchOptions::default())
        .unwrap();
    assert!(hits.is_empty());

    // header + rows * dimension * f32
    let expected = 16 + 7 * generator.dimension().get() * 4;
    let size = std::fs::metadata(&all.cache_path).unwrap().len();
    assert_eq!(size as usize, expected);
}

#[test]
fn test_subset_hits_point_at_loaded_rows() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let corpus = session::load_corpus(&settings).unwrap();
    let options = SessionOptions {
        subset: DomainSubset::excluding(["socioeconomic"]),
        force_rebuild: false,
    };
    let session = open_session(
        &session::cache_for(&settings),
        &corpus,
        Arc::new(default_generator()),
        &options,
        &mut no_progress(),
    )
    .unwrap();
    assert_eq!(session.search.corpus().len(), 5);

    let hits = session
        .search
        .search("alcohol and brain", &SearchOptions::default().with_cutoff(-1.0))
        .unwrap();
    assert_eq!(hits.len(), 5);
    for hit in &hits {
        let row = corpus.get(hit.row).unwrap();
        assert_eq!(row.label, hit.label);
        assert_eq!(row.domain, hit.domain);
    }

    let alcohol = hits
        .iter()
        .find(|hit| hit.label == "Alcohol units per week")
        .unwrap();
    assert_eq!(alcohol.row, 6);
}

#[test]
fn test_models_do_not_share_caches() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);
    let settings = workspace.settings();
    let cache = session::cache_for(&settings);
    let corpus = session::load_corpus(&settings).unwrap();

    let first = open_session(
        &cache,
        &corpus,
        Arc::new(default_generator()),
        &SessionOptions::default(),
        &mut no_progress(),
    )
    .unwrap();
    let second = open_session(
        &cache,
        &corpus,
        Arc::new(default_generator().named("other-keyword-model")),
        &SessionOptions::default(),
        &mut no_progress(),
    )
    .unwrap();

    assert_eq!(second.source, CacheSource::Built);
    assert_ne!(first.cache_path, second.cache_path);
    assert_eq!(second.metadata.model_name, "other-keyword-model");
}

#[test]
fn test_missing_csv_is_data_not_found() {
    let workspace = TestWorkspace::new();
    let err = session::load_corpus(&workspace.settings()).unwrap_err();
    assert!(matches!(err, SearchError::DataNotFound { .. }));
    assert_eq!(ExitCode::from_error(&err), ExitCode::IoError);
}
