use audit_claw_tools::*;
use std::fs;
use tempfile::TempDir;

const CATALOG: &str = r#"
- id: theHarvester
  name: theHarvester
  description: OSINT reconnaissance
  source: https://github.com/laramies/theHarvester.git
  install_path: /srv/tools/theHarvester
  probe: { program: test, args: ["-f", "/srv/tools/theHarvester/theHarvester.py"] }
  run: { program: python3, args: ["/srv/tools/theHarvester/theHarvester.py", "-d", "{target}"] }
- id: Nmap
  name: Nmap
  description: Network scan
  probe: { program: nmap, args: ["--version"] }
  run: { program: nmap, args: ["-sV", "{target}"] }
- id: Nikto
  name: Nikto
  description: Web scan
  source: https://github.com/sullo/nikto.git
  install_path: /srv/tools/nikto
  probe: { program: test, args: ["-f", "/srv/tools/nikto/program/nikto.pl"] }
  run: { program: perl, args: ["/srv/tools/nikto/program/nikto.pl", "-h", "{target}"] }
- id: sqlmap
  name: sqlmap
  description: SQL injection testing
  source: https://github.com/sqlmapproject/sqlmap.git
  install_path: /srv/tools/sqlmap
  probe: { program: test, args: ["-f", "/srv/tools/sqlmap/sqlmap.py"] }
  run: { program: python3, args: ["/srv/tools/sqlmap/sqlmap.py", "-u", "http://{target}/"] }
  requires_confirmation: true
"#;

#[test]
fn test_load_catalog_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tools.yaml");
    fs::write(&path, CATALOG).unwrap();

    let registry = ToolRegistry::load(&path).unwrap();
    assert_eq!(registry.len(), 4);

    let nmap = registry.get(ToolId::Nmap).unwrap();
    assert!(!nmap.is_acquirable());
    assert!(!nmap.requires_confirmation);
    assert_eq!(nmap.run_command("10.0.0.1").args, vec!["-sV", "10.0.0.1"]);

    let sqlmap = registry.get(ToolId::Sqlmap).unwrap();
    assert!(sqlmap.requires_confirmation);
    assert!(sqlmap.is_acquirable());
}

#[test]
fn test_catalog_missing_sequence_tool_is_rejected() {
    let partial: String = CATALOG.split("- id: sqlmap").next().unwrap().to_string();
    let result = ToolRegistry::from_yaml_str(&partial);
    assert!(matches!(result, Err(RegistryError::Missing(ToolId::Sqlmap))));
}

#[test]
fn test_catalog_unknown_tool_is_parse_error() {
    let content = CATALOG.replace("id: Nikto", "id: Burp");
    let result = ToolRegistry::from_yaml_str(&content);
    assert!(matches!(result, Err(RegistryError::Parse(_))));
}

#[test]
fn test_missing_catalog_file_is_io_error() {
    let result = ToolRegistry::load(std::path::Path::new("/nonexistent/tools.yaml"));
    assert!(matches!(result, Err(RegistryError::Io(_))));
}

#[test]
fn test_builtin_paths_live_under_tools_dir() {
    let dir = TempDir::new().unwrap();
    let registry = ToolRegistry::builtin(dir.path());
    for tool in registry.iter() {
        if let Some(path) = &tool.install_path {
            assert!(path.starts_with(dir.path()));
        }
    }
    let harvester = registry.get(ToolId::TheHarvester).unwrap();
    let clone = harvester.acquisition().unwrap();
    assert_eq!(clone.args[0], "clone");
    assert!(clone.args[2].ends_with("theHarvester"));
}
