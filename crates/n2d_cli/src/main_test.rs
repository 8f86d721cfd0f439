use super::*;

#[test]
fn test_inspect_subcommand_parses() {
  let cli = Cli::try_parse_from(["n2d", "inspect", "--mesh", "hero.obj"]).unwrap();
  match cli.command {
    Commands::Inspect(args) => {
      assert_eq!(args.mesh, std::path::PathBuf::from("hero.obj"));
      assert!(args.inspect_json.is_none());
    }
    other => panic!("expected inspect, parsed {other:?}"),
  }
}

#[test]
fn test_bake_subcommand_parses() {
  let cli = Cli::try_parse_from([
    "n2d",
    "bake",
    "--mesh",
    "hero.obj",
    "--normal-pattern",
    "n_1001.png",
    "--output-pattern",
    "out_1001.exr",
  ])
  .unwrap();
  assert!(matches!(cli.command, Commands::Bake(_)));
}

#[test]
fn test_subcommand_is_required() {
  assert!(Cli::try_parse_from(["n2d"]).is_err());
}
