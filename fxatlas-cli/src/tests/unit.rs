//! Focused unit tests covering CLI configuration resolution.

use super::*;
use crate::query::{CountriesArgs, CountriesConfig, CountryArgs, DeleteArgs, NamedCountryConfig};
use crate::refresh::{AppConfig, config_from_layers_for_test};
use camino::Utf8PathBuf;
use fxatlas_core::{CountryQuery, SortOrder};
use fxatlas_data::sources::{DEFAULT_COUNTRIES_URL, DEFAULT_RATES_URL};
use rstest::rstest;
use std::time::Duration;

#[rstest]
fn refresh_config_applies_defaults() {
    let config = AppConfig::try_from(RefreshArgs::default()).expect("defaults should resolve");

    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(config.max_connections.get(), 10);
    assert_eq!(config.summary_path, Utf8PathBuf::from("cache/summary.json"));
    assert_eq!(config.sources.countries_url, DEFAULT_COUNTRIES_URL);
    assert_eq!(config.sources.rates_url, DEFAULT_RATES_URL);
    assert_eq!(config.sources.countries_timeout, Duration::from_secs(15));
    assert_eq!(config.sources.rates_timeout, Duration::from_secs(10));
}

#[rstest]
fn refresh_config_applies_overrides() {
    let args = RefreshArgs {
        database: Some(Utf8PathBuf::from("/tmp/atlas.db")),
        max_connections: Some(3),
        summary_path: Some(Utf8PathBuf::from("/tmp/summary.json")),
        countries_url: Some("http://localhost:9000/all".to_owned()),
        rates_url: Some("http://localhost:9001/latest".to_owned()),
        countries_timeout_secs: Some(4),
        rates_timeout_secs: Some(2),
        user_agent: Some("atlas-test/2.0".to_owned()),
    };

    let config = AppConfig::try_from(args).expect("overrides should resolve");

    assert_eq!(config.database, Utf8PathBuf::from("/tmp/atlas.db"));
    assert_eq!(config.max_connections.get(), 3);
    assert_eq!(config.sources.countries_url, "http://localhost:9000/all");
    assert_eq!(config.sources.rates_timeout, Duration::from_secs(2));
    assert_eq!(config.sources.user_agent, "atlas-test/2.0");
}

#[rstest]
#[case::connections(
    RefreshArgs { max_connections: Some(0), ..RefreshArgs::default() },
    ARG_MAX_CONNECTIONS
)]
#[case::countries_timeout(
    RefreshArgs { countries_timeout_secs: Some(0), ..RefreshArgs::default() },
    ARG_COUNTRIES_TIMEOUT
)]
#[case::rates_timeout(
    RefreshArgs { rates_timeout_secs: Some(0), ..RefreshArgs::default() },
    ARG_RATES_TIMEOUT
)]
fn refresh_config_rejects_zero_values(#[case] args: RefreshArgs, #[case] expected: &str) {
    let err = AppConfig::try_from(args).expect_err("zero should be rejected");
    match err {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, expected),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "database": "from-file.db",
            "rates_timeout_secs": 7,
            "user_agent": "from-file/1.0",
        }),
        None,
    );
    composer.push_environment(json!({
        "database": "from-env.db",
        "max_connections": 4,
    }));
    composer.push_cli(json!({ "database": "from-cli.db" }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.database, Utf8PathBuf::from("from-cli.db"));
    assert_eq!(config.max_connections.get(), 4);
    assert_eq!(config.sources.rates_timeout, Duration::from_secs(7));
    assert_eq!(config.sources.user_agent, "from-file/1.0");
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "max_connections": "many" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
#[case(None, SortOrder::NameAsc)]
#[case(Some("gdp_desc"), SortOrder::GdpDesc)]
#[case(Some("NAME_DESC"), SortOrder::NameDesc)]
fn countries_config_parses_sort(#[case] sort: Option<&str>, #[case] expected: SortOrder) {
    let args = CountriesArgs {
        region: Some("Africa".to_owned()),
        sort: sort.map(str::to_owned),
        ..CountriesArgs::default()
    };

    let config = CountriesConfig::try_from(args).expect("config should resolve");

    assert_eq!(
        config.query,
        CountryQuery::default()
            .with_region("Africa")
            .with_sort(expected)
    );
}

#[rstest]
fn countries_config_rejects_unknown_sort() {
    let args = CountriesArgs {
        sort: Some("population".to_owned()),
        ..CountriesArgs::default()
    };
    let err = CountriesConfig::try_from(args).expect_err("unknown sort");
    assert!(matches!(err, CliError::InvalidSort(_)), "got {err:?}");
}

#[rstest]
#[case::missing(None)]
#[case::blank(Some("  ".to_owned()))]
fn country_requires_a_name(#[case] name: Option<String>) {
    let args = CountryArgs {
        name,
        ..CountryArgs::default()
    };
    let err = NamedCountryConfig::try_from(args).expect_err("name required");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_NAME);
            assert_eq!(env, ENV_COUNTRY_NAME);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn delete_reports_its_own_environment_variable() {
    let err = NamedCountryConfig::try_from(DeleteArgs::default()).expect_err("name required");
    match err {
        CliError::MissingArgument { env, .. } => assert_eq!(env, ENV_DELETE_NAME),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn parses_subcommands_from_argv() {
    let cli = Cli::try_parse_from([
        "fxatlas",
        "countries",
        "--region",
        "Africa",
        "--sort",
        "gdp_desc",
    ])
    .expect("argv should parse");
    match cli.command {
        Command::Countries(args) => {
            assert_eq!(args.region.as_deref(), Some("Africa"));
            assert_eq!(args.sort.as_deref(), Some("gdp_desc"));
        }
        other => panic!("expected countries command, found {other:?}"),
    }
}
