//! CLI command parsing and helper tests.
//!
//! The CLI is a binary crate, so argument parsing is tested on a mirror of
//! the `Cli` struct via clap `try_parse_from`, and the file handling the
//! commands rely on is tested through the library.

// ============================================================================
// Parameter and launch config loading
// ============================================================================

mod loading {
    use lindblad_mpo::{LaunchConfig, Parameters, RuleSet, verify_parameters};

    #[test]
    fn test_load_yaml_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.yaml");
        std::fs::write(
            &path,
            "N: 4\nt_final: 2.0\ntau: 0.1\nh_z: [0.1, 0.2, 0.3, 0.4]\n1q_indices: [0, 3]\n",
        )
        .unwrap();

        let params = Parameters::from_path(&path).unwrap();
        assert_eq!(params.len(), 5);
        assert_eq!(verify_parameters(&params, &RuleSet::default()), "");
    }

    #[test]
    fn test_load_json_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(&path, r#"{"N": 2, "t_final": 1.0, "tau": 0.5, "J": 1.0}"#).unwrap();

        let params = Parameters::from_path(&path).unwrap();
        assert_eq!(params.num_sites(), Some(2));
        assert_eq!(verify_parameters(&params, &RuleSet::default()), "");
    }

    #[test]
    fn test_ignored_key_passes_verification() {
        let params = Parameters::new()
            .with("N", 2)
            .with("t_final", 1.0)
            .with("tau", 0.5)
            .with("plot_title", "chain");
        assert!(verify_parameters(&params, &RuleSet::default()).contains("plot_title"));
        assert_eq!(
            verify_parameters(&params, &RuleSet::new().ignore("plot_title")),
            ""
        );
    }

    #[test]
    fn test_load_launch_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launch.yaml");
        std::fs::write(
            &path,
            "solver_path: /cygdrive/C/lmpo/bin/lindbladmpo.exe\nshell:\n  path: C:/cygwin64/bin/bash.exe\n",
        )
        .unwrap();

        let config = LaunchConfig::from_path(&path).unwrap();
        let line = config.display_command(std::path::Path::new("run.input.txt"));
        assert!(line.starts_with("C:/cygwin64/bin/bash.exe --login -c"));
        assert!(line.ends_with("input_file 'run.input.txt'\""));
    }

    #[test]
    fn test_missing_launch_config() {
        assert!(LaunchConfig::from_path("/nonexistent/launch.yaml").is_err());
    }
}

// ============================================================================
// Clap argument parsing (test via try_parse_from on equivalent structs)
// ============================================================================

mod clap_parsing {
    use clap::{Parser, Subcommand};

    // Mirror the CLI struct for testing (since main.rs is a binary)
    #[derive(Parser)]
    #[command(name = "lmpo")]
    struct TestCli {
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(Subcommand)]
    enum TestCommands {
        Verify {
            params: String,
            #[arg(long = "ignore", value_name = "KEY")]
            ignore: Vec<String>,
        },
        Build {
            params: String,
            #[arg(long = "ignore", value_name = "KEY")]
            ignore: Vec<String>,
        },
        Run {
            params: String,
            #[arg(long)]
            solver: Option<String>,
            #[arg(long)]
            shell: Option<String>,
            #[arg(long)]
            launch_config: Option<String>,
            #[arg(short, long, default_value = "table")]
            format: String,
            #[arg(short, long)]
            export: Option<String>,
            #[arg(long = "ignore", value_name = "KEY")]
            ignore: Vec<String>,
        },
        Show {
            prefix: String,
            #[arg(short, long, default_value = "table")]
            format: String,
            #[arg(short, long)]
            export: Option<String>,
        },
        Correlations {
            prefix: String,
            #[arg(short = 'n', long)]
            sites: usize,
            #[arg(long, default_value = "zz")]
            name: String,
            #[arg(short, long)]
            time: Option<f64>,
        },
        Version,
    }

    // --- Verify / build ---

    #[test]
    fn test_parse_verify() {
        let cli = TestCli::try_parse_from(["lmpo", "verify", "chain.yaml"]).unwrap();
        match cli.command {
            TestCommands::Verify { params, ignore } => {
                assert_eq!(params, "chain.yaml");
                assert!(ignore.is_empty());
            }
            _ => panic!("Expected Verify command"),
        }
    }

    #[test]
    fn test_parse_build_with_ignored_keys() {
        let cli = TestCli::try_parse_from([
            "lmpo",
            "build",
            "chain.yaml",
            "--ignore",
            "plot_title",
            "--ignore",
            "notes",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Build { params, ignore } => {
                assert_eq!(params, "chain.yaml");
                assert_eq!(ignore, vec!["plot_title", "notes"]);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_parse_verify_missing_params() {
        assert!(TestCli::try_parse_from(["lmpo", "verify"]).is_err());
    }

    // --- Run ---

    #[test]
    fn test_parse_run_minimal() {
        let cli = TestCli::try_parse_from(["lmpo", "run", "chain.yaml"]).unwrap();
        match cli.command {
            TestCommands::Run {
                params,
                launch_config,
                format,
                export,
                ..
            } => {
                assert_eq!(params, "chain.yaml");
                assert!(launch_config.is_none());
                assert_eq!(format, "table");
                assert!(export.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_run_with_all_args() {
        let cli = TestCli::try_parse_from([
            "lmpo",
            "-vv",
            "run",
            "chain.json",
            "--solver",
            "/opt/lmpo/bin/lindbladmpo",
            "--shell",
            "/bin/bash",
            "--launch-config",
            "launch.yaml",
            "-f",
            "json",
            "-e",
            "result.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            TestCommands::Run {
                params,
                solver,
                shell,
                launch_config,
                format,
                export,
                ignore,
            } => {
                assert_eq!(params, "chain.json");
                assert_eq!(solver.unwrap(), "/opt/lmpo/bin/lindbladmpo");
                assert_eq!(shell.unwrap(), "/bin/bash");
                assert_eq!(launch_config.unwrap(), "launch.yaml");
                assert_eq!(format, "json");
                assert_eq!(export.unwrap(), "result.json");
                assert!(ignore.is_empty());
            }
            _ => panic!("Expected Run command"),
        }
    }

    // --- Show / correlations ---

    #[test]
    fn test_parse_show() {
        let cli = TestCli::try_parse_from(["lmpo", "show", "out/chain", "--format", "yaml"])
            .unwrap();
        match cli.command {
            TestCommands::Show {
                prefix,
                format,
                export,
            } => {
                assert_eq!(prefix, "out/chain");
                assert_eq!(format, "yaml");
                assert!(export.is_none());
            }
            _ => panic!("Expected Show command"),
        }
    }

    #[test]
    fn test_parse_correlations() {
        let cli = TestCli::try_parse_from(["lmpo", "correlations", "out/chain", "-n", "4"])
            .unwrap();
        match cli.command {
            TestCommands::Correlations {
                prefix,
                sites,
                name,
                time,
            } => {
                assert_eq!(prefix, "out/chain");
                assert_eq!(sites, 4);
                assert_eq!(name, "zz");
                assert!(time.is_none());
            }
            _ => panic!("Expected Correlations command"),
        }

        let cli = TestCli::try_parse_from([
            "lmpo",
            "correlations",
            "out/chain",
            "--sites",
            "3",
            "--name",
            "xy",
            "-t",
            "0.5",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Correlations { name, time, .. } => {
                assert_eq!(name, "xy");
                assert_eq!(time, Some(0.5));
            }
            _ => panic!("Expected Correlations command"),
        }
    }

    #[test]
    fn test_parse_correlations_requires_sites() {
        assert!(TestCli::try_parse_from(["lmpo", "correlations", "out/chain"]).is_err());
    }

    #[test]
    fn test_parse_version() {
        let cli = TestCli::try_parse_from(["lmpo", "version"]).unwrap();
        assert!(matches!(cli.command, TestCommands::Version));
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(TestCli::try_parse_from(["lmpo", "compile"]).is_err());
    }
}
