use deploy_gate::DeployError;
use deploy_gate::config::Config;
use deploy_gate::deploy::{DeployAddon, DeployInput};
use deploy_gate::gate::{BuildFacts, Gate, GateOutcome};
use deploy_gate::shell::{Builder, CmdOptions, Color, Node};
use serde_json::{Value, json};

const DEFAULT_GATE: &str = "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master)";

fn input(deploy: Value) -> DeployInput {
    serde_json::from_value(json!({ "deploy": deploy })).unwrap()
}

fn compile(deploy: Value) -> Builder {
    deploy_gate::compile(input(deploy)).unwrap()
}

/// Gate conditions of the top-level blocks, in order.
fn gates(deploy: Value) -> Vec<String> {
    compile(deploy)
        .nodes()
        .iter()
        .map(|n| match n {
            Node::If { condition, .. } => condition.clone(),
            other => panic!("top-level node is not an if: {other:?}"),
        })
        .collect()
}

fn script(text: &str) -> Node {
    Node::cmd(text, CmdOptions::SCRIPT)
}

fn tool(text: &str) -> Node {
    Node::cmd(text, CmdOptions::TOOL)
}

fn red(text: &str) -> Node {
    Node::echo(text, Some(Color::Red))
}

fn terminate_on_failure() -> Node {
    Node::if_then(
        "$? -ne 0",
        vec![
            red("Failed to deploy."),
            Node::cmd("travis_terminate 2", CmdOptions::default()),
        ],
        None,
    )
}

macro_rules! gate_test {
    ($name:ident, $deploy:expr, $gate:expr) => {
        #[test]
        fn $name() {
            assert_eq!(gates($deploy), vec![$gate.to_string()], "deploy: {}", $deploy);
        }
    };
}

// ── Gate expressions ──

gate_test!(gate_default, json!({ "provider": "heroku" }), DEFAULT_GATE);
gate_test!(
    gate_ignores_params,
    json!({ "provider": "heroku", "password": "foo", "email": "user@host" }),
    DEFAULT_GATE
);
gate_test!(
    gate_implicit_app_branches,
    json!({ "provider": "heroku", "app": { "staging": "foo", "production": "bar" } }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = staging || $TRAVIS_BRANCH = production)"
);
gate_test!(
    gate_app_string_uses_default_branch,
    json!({ "provider": "heroku", "app": "my-app" }),
    DEFAULT_GATE
);
gate_test!(
    gate_explicit_branch,
    json!({ "provider": "heroku", "on": { "branch": "production" } }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = production)"
);
gate_test!(
    gate_explicit_branch_list_overrides_app,
    json!({ "provider": "heroku", "app": { "staging": "foo" }, "on": { "branch": ["a", "b"] } }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = a || $TRAVIS_BRANCH = b)"
);
gate_test!(
    gate_on_tags,
    json!({ "provider": "heroku", "on": { "tags": true } }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master) && (-n $TRAVIS_TAG)"
);
gate_test!(
    gate_tags_false_is_default,
    json!({ "provider": "heroku", "on": { "tags": false } }),
    DEFAULT_GATE
);
gate_test!(
    gate_single_condition,
    json!({ "provider": "heroku", "on": { "condition": "$FOO = foo" } }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master) && ($FOO = foo)"
);
gate_test!(
    gate_multiple_conditions,
    json!({ "provider": "heroku", "on": { "condition": ["$FOO = foo", "$BAR = bar"] } }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master) && (($FOO = foo) && ($BAR = bar))"
);
gate_test!(
    gate_single_element_condition_list,
    json!({ "provider": "heroku", "on": { "condition": ["$FOO = foo"] } }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master) && (($FOO = foo))"
);
gate_test!(
    gate_condition_list_drops_blank_entries,
    json!({ "provider": "heroku", "on": { "condition": ["", "$FOO = foo"] } }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master) && (($FOO = foo))"
);
gate_test!(
    gate_empty_condition_string,
    json!({ "provider": "heroku", "on": { "condition": "" } }),
    DEFAULT_GATE
);
gate_test!(
    gate_empty_condition_list,
    json!({ "provider": "heroku", "on": { "condition": [] } }),
    DEFAULT_GATE
);
gate_test!(
    gate_everything_combined,
    json!({
        "provider": "heroku",
        "app": { "staging": "foo", "production": "bar" },
        "on": { "tags": true, "condition": "$FOO = foo" }
    }),
    "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = staging || $TRAVIS_BRANCH = production) && (-n $TRAVIS_TAG) && ($FOO = foo)"
);

// ── Deploys if conditions apply ──

fn full_deploy() -> Builder {
    let doc = json!({
        "deploy": { "provider": "heroku", "password": "foo", "email": "user@host" },
        "before_deploy": ["./before_deploy_1.sh", "./before_deploy_2.sh"],
        "after_deploy": ["./after_deploy_1.sh", "./after_deploy_2.sh"]
    });
    deploy_gate::compile(serde_json::from_value(doc).unwrap()).unwrap()
}

#[test]
fn deploy_block_contains_scripts_and_commands() {
    let sh = full_deploy();
    let block = sh.find_if(DEFAULT_GATE).unwrap();

    assert!(block.contains(&script("./before_deploy_1.sh")));
    assert!(block.contains(&script("./before_deploy_2.sh")));
    assert!(block.contains(&tool("rvm 1.9.3 --fuzzy do ruby -S gem install dpl")));
    assert!(block.contains(&tool(
        r#"rvm 1.9.3 --fuzzy do ruby -S dpl --provider="heroku" --password="foo" --email="user@host" --fold"#
    )));
    assert!(block.contains(&terminate_on_failure()));
    assert!(block.contains(&script("./after_deploy_1.sh")));
    assert!(block.contains(&script("./after_deploy_2.sh")));
}

#[test]
fn scripts_merged_into_deploy_mapping() {
    let sh = compile(json!({
        "provider": "heroku",
        "password": "foo",
        "before_deploy": ["./before_deploy_1.sh"],
        "after_deploy": "./after_deploy_1.sh"
    }));
    let block = sh.find_if(DEFAULT_GATE).unwrap();
    assert!(block.contains(&script("./before_deploy_1.sh")));
    assert!(block.contains(&script("./after_deploy_1.sh")));
    assert!(block.contains(&tool(
        r#"rvm 1.9.3 --fuzzy do ruby -S dpl --provider="heroku" --password="foo" --fold"#
    )));
}

#[test]
fn sexp_of_deploy_block() {
    let sexp = full_deploy().to_sexp();
    let block = &sexp[1][0];
    assert_eq!(block[0], "if");
    assert_eq!(block[1], DEFAULT_GATE);
    assert_eq!(
        block[2][1][1][0],
        json!(["cmd", "./before_deploy_1.sh", { "assert": true, "echo": true, "timing": true }])
    );
    assert_eq!(
        block[2][1][1][2],
        json!(["cmd", "rvm 1.9.3 --fuzzy do ruby -S gem install dpl", { "assert": true, "timing": true }])
    );
    assert_eq!(block[3][0], "else");
}

// ── Multiple providers ──

fn two_providers() -> Value {
    json!([
        { "provider": "heroku", "password": "foo", "email": "user@host", "on": { "condition": "$FOO = foo" } },
        { "provider": "nodejitsu", "user": "foo", "api_key": "bar", "on": { "condition": "$BAR = bar" } }
    ])
}

#[test]
fn multiple_providers_gates_in_order() {
    assert_eq!(
        gates(two_providers()),
        vec![
            "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master) && ($FOO = foo)".to_string(),
            "(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master) && ($BAR = bar)".to_string(),
        ]
    );
}

#[test]
fn multiple_providers_commands_stay_in_their_block() {
    let sh = compile(two_providers());
    let heroku_cmd = tool(
        r#"rvm 1.9.3 --fuzzy do ruby -S dpl --provider="heroku" --password="foo" --email="user@host" --fold"#,
    );
    let nodejitsu_cmd = tool(
        r#"rvm 1.9.3 --fuzzy do ruby -S dpl --provider="nodejitsu" --user="foo" --api_key="bar" --fold"#,
    );

    let heroku = &sh.nodes()[0];
    let nodejitsu = &sh.nodes()[1];
    assert!(heroku.contains(&heroku_cmd));
    assert!(!heroku.contains(&nodejitsu_cmd));
    assert!(nodejitsu.contains(&nodejitsu_cmd));
    assert!(!nodejitsu.contains(&heroku_cmd));
}

#[test]
fn multiple_providers_share_scripts() {
    let doc = json!({
        "deploy": two_providers(),
        "before_deploy": "./before.sh",
        "after_deploy": ["./after.sh"]
    });
    let sh = deploy_gate::compile(serde_json::from_value(doc).unwrap()).unwrap();
    for block in sh.nodes() {
        assert!(block.contains(&script("./before.sh")));
        assert!(block.contains(&script("./after.sh")));
    }
}

#[test]
fn provider_without_on_gets_plain_default() {
    let gates = gates(json!([
        { "provider": "heroku", "on": { "tags": true } },
        { "provider": "s3" }
    ]));
    assert_eq!(gates[1], DEFAULT_GATE);
}

// ── allow_failure ──

#[test]
fn allow_failure_removes_termination() {
    let sh = compile(json!({ "provider": "heroku", "password": "foo", "email": "user@host", "allow_failure": true }));
    assert!(!sh.contains(&terminate_on_failure()));
    assert!(sh.find_if("$? -ne 0").is_none());
}

#[test]
fn failure_terminates_by_default() {
    let sh = compile(json!({ "provider": "heroku" }));
    assert!(sh.contains(&terminate_on_failure()));
}

// ── Deploy condition fails ──

const NOT_PERMITTED: &str =
    "Skipping deployment with the heroku provider because this branch is not permitted to deploy as per configuration.";
const CUSTOM_CONDITION: &str =
    "Skipping deployment with the heroku provider because a custom condition was not met.";
const IS_PULL_REQUEST: &str =
    "Skipping deployment with the heroku provider because the current build is a pull request.";

fn failing_condition_else() -> Node {
    let sh = compile(json!({ "provider": "heroku", "on": { "condition": "$ENV_2 = 1" } }));
    sh.find_if("(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master) && ($ENV_2 = 1)")
        .unwrap()
        .otherwise()
        .unwrap()
        .clone()
}

/// The `then` block of an `If`.
fn then_of(node: &Node) -> &Node {
    match node {
        Node::If { then, .. } => &**then,
        other => panic!("not an if: {other:?}"),
    }
}

#[test]
fn pull_request_diagnostic() {
    let otherwise = failing_condition_else();
    let pr = otherwise.find_if("(! -z $TRAVIS_PULL_REQUEST)").unwrap();
    assert!(then_of(pr).contains(&red(IS_PULL_REQUEST)));
}

#[test]
fn branch_diagnostic() {
    let otherwise = failing_condition_else();
    let branch = otherwise.find_if("(! $TRAVIS_BRANCH = master)").unwrap();
    assert!(then_of(branch).contains(&red(NOT_PERMITTED)));
    assert!(!then_of(branch).contains(&red(CUSTOM_CONDITION)));
}

#[test]
fn custom_condition_diagnostic() {
    let otherwise = failing_condition_else();
    let custom = otherwise.find_if("(! $ENV_2 = 1)").unwrap();
    assert!(then_of(custom).contains(&red(CUSTOM_CONDITION)));
}

#[test]
fn diagnostics_nest_in_priority_order() {
    let otherwise = failing_condition_else();
    let pr = otherwise.find_if("(! -z $TRAVIS_PULL_REQUEST)").unwrap();
    // branch is only checked when the build is not a pull request
    let branch = pr.otherwise().unwrap().find_if("(! $TRAVIS_BRANCH = master)").unwrap();
    assert!(branch.otherwise().unwrap().find_if("(! $ENV_2 = 1)").is_some());
    assert!(then_of(pr).find_if("(! $TRAVIS_BRANCH = master)").is_none());
}

#[test]
fn app_branch_diagnostic_negates_whole_clause() {
    let sh = compile(json!({ "provider": "heroku", "app": { "staging": "foo", "production": "bar" } }));
    assert!(sh
        .find_if("(! ($TRAVIS_BRANCH = staging || $TRAVIS_BRANCH = production))")
        .is_some());
}

// ── Classification ──

#[test]
fn classify_matches_diagnostic_priority() {
    let config = Config::default_config();
    let raw = serde_json::from_value(json!({ "provider": "heroku", "on": { "condition": "$ENV_2 = 1" } })).unwrap();
    let spec = deploy_gate::deploy::ProviderSpec::from_mapping(0, &raw).unwrap();
    let gate = Gate::compile(&spec, &config.settings.default_branch);

    assert_eq!(gate.classify(&BuildFacts::push("master"), true), GateOutcome::Pass);
    assert_eq!(gate.classify(&BuildFacts::push("dev").as_pull_request(), false), GateOutcome::PullRequest);
    assert_eq!(gate.classify(&BuildFacts::push("dev"), false), GateOutcome::Branch);
    assert_eq!(gate.classify(&BuildFacts::push("master"), false), GateOutcome::Condition);
}

// ── Errors ──

#[test]
fn missing_provider_fails() {
    let err = deploy_gate::compile(input(json!({ "password": "foo" }))).unwrap_err();
    assert!(err.to_string().contains("missing required `provider` key"));
}

#[test]
fn scalar_deploy_fails() {
    let err = deploy_gate::compile(input(json!(true))).unwrap_err();
    assert!(matches!(err, DeployError::Shape { .. }));
}

#[test]
fn invalid_entry_does_not_block_others() {
    let config = Config::default_config();
    let addon = DeployAddon::from_input(
        &config,
        input(json!([{ "provider": "heroku" }, { "email": "user@host" }, { "provider": "s3" }])),
    )
    .unwrap();
    let mut sh = Builder::new();
    let err = addon.deploy(&mut sh).unwrap_err();

    assert!(matches!(err, DeployError::Providers(ref e) if e.len() == 1 && e[0].index() == 1));
    assert_eq!(sh.len(), 2);
    assert!(sh.contains(&tool(r#"rvm 1.9.3 --fuzzy do ruby -S dpl --provider="heroku" --fold"#)));
    assert!(sh.contains(&tool(r#"rvm 1.9.3 --fuzzy do ruby -S dpl --provider="s3" --fold"#)));
}

#[test]
fn rejected_entry_scripts_stay_out_of_valid_blocks() {
    let config = Config::default_config();
    let addon = DeployAddon::from_input(
        &config,
        input(json!([{ "provider": "heroku" }, { "before_deploy": "./rm-rf-prod.sh" }])),
    )
    .unwrap();
    let mut sh = Builder::new();
    let err = addon.deploy(&mut sh).unwrap_err();

    assert!(matches!(err, DeployError::Providers(ref e) if e.len() == 1 && e[0].index() == 1));
    assert_eq!(sh.len(), 1);
    assert!(!sh.contains(&script("./rm-rf-prod.sh")));
}

#[test]
fn compile_json_entry_point() {
    let sh = deploy_gate::compile_json(
        r#"{ "deploy": { "provider": "heroku" }, "build": { "branch": "staging" } }"#,
    )
    .unwrap();
    assert_eq!(sh.len(), 1);
    assert!(deploy_gate::compile_json("not json").is_err());
}
