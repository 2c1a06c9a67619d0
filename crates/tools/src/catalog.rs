//! Stock tool catalog.

use crate::descriptor::{CommandTemplate, ToolDescriptor, ToolId};
use std::path::Path;

pub fn builtin_descriptors(tools_dir: &Path) -> Vec<ToolDescriptor> {
    let sqlmap_dir = tools_dir.join("sqlmap");
    let nikto_dir = tools_dir.join("nikto");
    let harvester_dir = tools_dir.join("theHarvester");

    let sqlmap_py = sqlmap_dir.join("sqlmap.py").to_string_lossy().to_string();
    let nikto_pl = nikto_dir
        .join("program")
        .join("nikto.pl")
        .to_string_lossy()
        .to_string();
    let harvester_py = harvester_dir
        .join("theHarvester.py")
        .to_string_lossy()
        .to_string();

    vec![
        ToolDescriptor {
            id: ToolId::Sqlmap,
            name: "sqlmap".to_string(),
            description: "SQL injection detection and exploitation.".to_string(),
            source: Some("https://github.com/sqlmapproject/sqlmap.git".to_string()),
            install_path: Some(sqlmap_dir),
            probe: CommandTemplate::new("test", ["-f".to_string(), sqlmap_py.clone()]),
            run: CommandTemplate::new(
                "python3",
                [
                    sqlmap_py,
                    "-u".to_string(),
                    "http://{target}/test.php?id=1".to_string(),
                    "--batch".to_string(),
                    "--level=1".to_string(),
                    "--risk=1".to_string(),
                ],
            ),
            requires_confirmation: true,
        },
        ToolDescriptor {
            id: ToolId::Nmap,
            name: "Nmap".to_string(),
            description: "Network scan (ports, services, OS).".to_string(),
            // Expected to be installed system-wide
            source: None,
            install_path: None,
            probe: CommandTemplate::new("nmap", ["--version"]),
            run: CommandTemplate::new("nmap", ["-sV", "-T4", "{target}"]),
            requires_confirmation: false,
        },
        ToolDescriptor {
            id: ToolId::Nikto,
            name: "Nikto".to_string(),
            description: "Web vulnerability scan.".to_string(),
            source: Some("https://github.com/sullo/nikto.git".to_string()),
            install_path: Some(nikto_dir),
            probe: CommandTemplate::new("test", ["-f".to_string(), nikto_pl.clone()]),
            run: CommandTemplate::new(
                "perl",
                [nikto_pl, "-h".to_string(), "{target}".to_string()],
            ),
            requires_confirmation: false,
        },
        ToolDescriptor {
            id: ToolId::TheHarvester,
            name: "theHarvester".to_string(),
            description: "OSINT reconnaissance (emails, subdomains).".to_string(),
            source: Some("https://github.com/laramies/theHarvester.git".to_string()),
            install_path: Some(harvester_dir),
            probe: CommandTemplate::new("test", ["-f".to_string(), harvester_py.clone()]),
            run: CommandTemplate::new(
                "python3",
                [
                    harvester_py,
                    "-d".to_string(),
                    "{target}".to_string(),
                    "-b".to_string(),
                    "google".to_string(),
                ],
            ),
            requires_confirmation: false,
        },
    ]
}
