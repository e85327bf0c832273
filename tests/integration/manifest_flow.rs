//! Tool output → parser → generator → on-disk artifact.

use manifest_sync::manifest::{AppRecord, ManifestGenerator, manifest_path};
use manifest_sync::vdf::{self, ParseOutcome, Value};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// SteamCMD-shaped output: diagnostic noise around real app blocks.
fn tool_output(blocks: &[String]) -> String {
    format!(
        "Redirecting stderr to 'logs/stderr.txt'\n\
         [  0%] Checking for available updates...\n\
         Steam Console Client (c) Valve Corporation - version 1700000000\n\
         Waiting for client config...OK\n\
         {}\
         Unloading Steam API...OK\n",
        blocks.join("AppID : 0, change number : 0\n")
    )
}

fn app_block(app_id: u32, depots: &str) -> String {
    format!(
        "\"{app_id}\"\n{{\n\
         \t\"common\"\n\t{{\n\t\t\"name\"\t\t\"App {app_id}\"\n\t}}\n\
         \t\"config\"\n\t{{\n\t\t\"installdir\"\t\t\"app_{app_id}\"\n\t}}\n\
         \t\"depots\"\n\t{{\n\
         \t\t\"branches\"\n\t\t{{\n\t\t\t\"public\"\n\t\t\t{{\n\t\t\t\t\"buildid\"\t\t\"9000\"\n\t\t\t}}\n\t\t}}\n\
         {depots}\
         \t}}\n\
         }}\n"
    )
}

fn depot_block(depot_id: &str, fields: &str) -> String {
    format!("\t\t\"{depot_id}\"\n\t\t{{\n{fields}\t\t}}\n")
}

#[test]
fn parser_yields_one_key_per_app_block() {
    let output = tool_output(&[
        app_block(4, ""),
        app_block(730, ""),
        app_block(221380, ""),
    ]);
    let ParseOutcome::Parsed(apps) = vdf::scan_tool_output(&output) else {
        panic!("expected parsed outcome");
    };
    assert_eq!(apps.len(), 3);
    for key in ["4", "730", "221380"] {
        assert!(apps.contains_key(key), "missing app {key}");
    }
}

#[test]
fn full_pipeline_writes_a_reparseable_manifest() {
    let depots = depot_block(
        "221381",
        "\t\t\t\"maxsize\"\t\t\"500\"\n\
         \t\t\t\"manifests\"\n\t\t\t{\n\t\t\t\t\"public\"\t\t\"m1\"\n\t\t\t}\n",
    );
    let output = tool_output(&[app_block(221380, &depots)]);

    let ParseOutcome::Parsed(apps) = vdf::scan_tool_output(&output) else {
        panic!("expected parsed outcome");
    };
    let record = AppRecord::from_vdf(221380, &apps["221380"]).unwrap();
    assert_eq!(record.name, "App 221380");
    assert_eq!(record.install_dir, "app_221380");
    assert_eq!(record.build_id, "9000");

    let document = ManifestGenerator::new(Some("windows".to_string())).generate(&record);

    let dir = TempDir::new().unwrap();
    let path = manifest_path(dir.path(), 221380);
    std::fs::write(&path, vdf::write(&document)).unwrap();
    assert_eq!(path.file_name().unwrap(), "appmanifest_221380.acf");

    // The artifact must parse back with the same structure
    let reparsed = vdf::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let state = reparsed["AppState"].as_map().unwrap();
    assert_eq!(state["appid"].as_str(), Some("221380"));
    assert_eq!(state["buildid"].as_str(), Some("9000"));
    assert_eq!(state["SizeOnDisk"].as_str(), Some("500"));

    let depot = state["InstalledDepots"].get("221381").unwrap();
    assert_eq!(depot.get("manifest").and_then(Value::as_str), Some("m1"));
    assert_eq!(depot.get("size").and_then(Value::as_str), Some("500"));
}

#[test]
fn installed_and_shared_sections_round_trip() {
    let depots = [
        depot_block(
            "11",
            "\t\t\t\"maxsize\"\t\t\"100\"\n\
             \t\t\t\"manifests\"\n\t\t\t{\n\t\t\t\t\"public\"\t\t\"m-11\"\n\t\t\t}\n",
        ),
        depot_block(
            "228980",
            "\t\t\t\"sharedinstall\"\t\t\"1\"\n\
             \t\t\t\"depotfromapp\"\t\t\"228980\"\n",
        ),
    ]
    .join("");
    let output = tool_output(&[app_block(10, &depots)]);

    let ParseOutcome::Parsed(apps) = vdf::scan_tool_output(&output) else {
        panic!("expected parsed outcome");
    };
    let record = AppRecord::from_vdf(10, &apps["10"]).unwrap();
    let document = ManifestGenerator::new(Some("windows".to_string())).generate(&record);

    let reparsed = vdf::parse(&vdf::write(&document)).unwrap();
    let state = reparsed["AppState"].as_map().unwrap();

    let installed = state["InstalledDepots"].as_map().unwrap();
    assert_eq!(installed.len(), 1);
    assert_eq!(
        installed["11"].get("manifest").and_then(Value::as_str),
        Some("m-11")
    );

    let shared = state["SharedDepots"].as_map().unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared["228980"].as_str(), Some("228980"));

    // Mutual exclusion survives the round trip
    assert!(!installed.contains_key("228980"));
    assert!(!shared.contains_key("11"));
}

#[test]
fn garbled_output_is_reported_as_unparsed() {
    let output = tool_output(&["\"730\"\n{\n\t\"common\"\n\t{\n\t\t\"broken\n}\n".to_string()]);
    match vdf::scan_tool_output(&output) {
        ParseOutcome::Unparsed(raw) => assert_eq!(raw, output),
        ParseOutcome::Parsed(_) => panic!("expected unparsed outcome"),
    }
}
