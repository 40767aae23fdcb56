//! Integration tests for replkit
//!
//! These tests verify that the mapping, the command tree, the flag parser and
//! the completer work together correctly.

use std::time::Duration;

use replkit::{
    mapping::{load_commands, parse_mapping, validate_completers, CompleterRegistry},
    parse_line, Command, Commands, Completer, Error, Flags, IpAndMask,
};

const MAPPING: &str = r#"
common_flags:
  vrf:
    long: vrf
    help: Routing table
    default: main
commands:
  - name: status
    help: Show daemon status
  - name: start
    help: Start the daemon
    flags:
      - long: force
        type: bool
        help: Start even if running
      - long: foo
        type: bool
        help: Enable foo mode
  - name: interface
    aliases: [int]
    help: Configure an interface
    subcommands:
      - name: set
        help: Change link settings
        completer: interfaces
      - name: address
        help: Assign an address
        common_flags: [vrf]
        flags:
          - long: net
            short: n
            type: ipmask
            help: Address and mask
          - long: no
            type: bool
            help: Remove instead of add
          - long: lifetime
            type: duration
            default: 1h
            help: Address lifetime
"#;

fn registry() -> CompleterRegistry {
    let mut reg = CompleterRegistry::new();
    reg.register("interfaces", |prefix, _rest| {
        ["eth0", "eth1", "wlan0"]
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| (*name).to_string())
            .collect()
    });
    reg
}

fn commands() -> Commands {
    load_commands(MAPPING, &registry()).unwrap()
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

// ==================== Mapping → Parse Integration ====================

#[test]
fn test_defaults_fill_every_flag() {
    let cmds = commands();
    let inv = parse_line(&cmds, "interface address").unwrap();
    assert_eq!(inv.flags.len(), 4);
    for (_, item) in inv.flags.iter() {
        assert!(item.is_default);
    }
    assert_eq!(inv.flags.get::<String>("vrf").unwrap(), "main");
    assert_eq!(
        inv.flags.get::<Duration>("lifetime").unwrap(),
        Duration::from_secs(3_600)
    );
    assert_eq!(inv.flags.get::<IpAndMask>("net").unwrap(), IpAndMask::default());
}

#[test]
fn test_full_line_with_cidr_and_dotted_mask() {
    let cmds = commands();
    let a = parse_line(&cmds, "int address --net 10.0.0.0/24 vrf=blue").unwrap();
    let b = parse_line(&cmds, "int address net 10.0.0.0 255.255.255.0 vrf blue").unwrap();
    assert_eq!(a.path, words(&["interface", "address"]));
    assert_eq!(
        a.flags.get::<IpAndMask>("net").unwrap(),
        b.flags.get::<IpAndMask>("net").unwrap()
    );
    assert_eq!(b.flags.get::<String>("vrf").unwrap(), "blue");
    assert!(!b.flags.is_default("vrf").unwrap());
}

#[test]
fn test_abbreviated_flags_through_tree() {
    let cmds = commands();
    let err = parse_line(&cmds, "start --fo").unwrap_err();
    assert!(matches!(err, Error::AmbiguousFlag { .. }));

    let inv = parse_line(&cmds, "start --for extra").unwrap();
    assert!(inv.flags.get::<bool>("force").unwrap());
    assert!(!inv.flags.get::<bool>("foo").unwrap());
    assert_eq!(inv.args, words(&["extra"]));
}

#[test]
fn test_bad_address_is_reported() {
    let cmds = commands();
    let err = parse_line(&cmds, "int address net badvalue").unwrap_err();
    assert_eq!(err.to_string(), "bad ip value for net");
}

#[test]
fn test_mapping_rejects_duplicate_flag() {
    let yaml = r#"
commands:
  - name: x
    flags:
      - long: dup
        help: one
      - long: dup
        help: two
"#;
    let err = load_commands(yaml, &CompleterRegistry::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("duplicate long flag: 'dup'"));
}

#[test]
fn test_mapping_requires_registered_completers() {
    let root = parse_mapping(MAPPING).unwrap();
    assert!(validate_completers(&root, &CompleterRegistry::new()).is_err());
    assert!(load_commands(MAPPING, &CompleterRegistry::new()).is_err());
}

// ==================== Mapping → Completion Integration ====================

#[test]
fn test_complete_root_prefix() {
    let cmds = commands();
    let (mut s, len) = Completer::new(&cmds).complete("st", 2);
    s.sort();
    assert_eq!(s, words(&["art ", "atus "]));
    assert_eq!(len, 2);
}

#[test]
fn test_complete_flags_at_leaf() {
    let cmds = commands();
    let line = "interface address ";
    let (s, _) = Completer::new(&cmds).complete(line, line.chars().count());
    assert_eq!(s, words(&["net ", "n ", "lifetime ", "vrf "]));

    let line = "int address li";
    let (s, len) = Completer::new(&cmds).complete(line, line.chars().count());
    assert_eq!(s, words(&["fetime "]));
    assert_eq!(len, 2);
}

#[test]
fn test_complete_custom_completer() {
    let cmds = commands();
    let line = "interface set et";
    let (s, len) = Completer::new(&cmds).complete(line, line.chars().count());
    assert_eq!(s, words(&["h0", "h1"]));
    assert_eq!(len, 2);
}

#[test]
fn test_complete_help_prefix() {
    let cmds = commands();
    let line = "help interface a";
    let (s, _) = Completer::new(&cmds).complete(line, line.chars().count());
    assert_eq!(s, words(&["ddress "]));
}

// ==================== Programmatic Tree ====================

#[test]
fn test_programmatic_tree_matches_mapping_behavior() {
    let mut flags = Flags::new();
    flags.uint64('c', "count", 3, "Echo requests to send");
    flags.duration_l("interval", Duration::from_secs(1), "Delay between requests");

    let mut ping = Command::new("ping", "Send echo requests");
    ping.flags = flags;
    let mut cmds = Commands::new();
    cmds.add(ping).unwrap();

    let inv = parse_line(&cmds, "ping c 5 interval=250ms 10.0.0.1").unwrap();
    assert_eq!(inv.flags.get::<u64>("count").unwrap(), 5);
    assert_eq!(
        inv.flags.get::<Duration>("interval").unwrap(),
        Duration::from_millis(250)
    );
    assert_eq!(inv.args, words(&["10.0.0.1"]));

    let json = serde_json::to_value(&inv).unwrap();
    assert_eq!(json["path"][0], "ping");
    assert_eq!(json["flags"]["interval"]["value"], "250ms");
}
