//! End-to-end pipeline scenarios from spec.md §8: concrete scenarios,
//! boundary behaviors, and a sample of the numbered invariants.

use axon::config::Settings;
use axon::graph::{EdgeKind, EdgeProps, NodeId, NodeKind, SymbolDetail};
use axon::pipeline::{CancellationToken, Pipeline};
use axon::types::{Confidence, TypeRole};
use tempfile::TempDir;

fn run(dir: &TempDir) -> axon::pipeline::PipelineOutcome {
    run_with_settings(dir, Settings::default())
}

fn run_with_settings(dir: &TempDir, settings: Settings) -> axon::pipeline::PipelineOutcome {
    let pipeline = Pipeline::new(settings);
    let cancellation = CancellationToken::new();
    pipeline.run(dir.path(), &cancellation).expect("pipeline run should succeed")
}

/// Scenario 1: two Python files, `a.py` calls and imports from `b.py`.
#[test]
fn two_python_files_produce_calls_and_imports_edges() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.py"), "from b import g\n\ndef f():\n    g()\n").unwrap();
    std::fs::write(dir.path().join("b.py"), "def g():\n    pass\n").unwrap();

    let mut settings = Settings::default();
    settings.indexing.source_roots.push(String::new());
    let outcome = run_with_settings(&dir, settings);
    let graph = &outcome.graph;

    let f_id = NodeId::symbol(NodeKind::Function, "a.py", "f");
    let g_id = NodeId::symbol(NodeKind::Function, "b.py", "g");
    assert!(graph.has_edge(&f_id, &g_id, EdgeKind::Calls));
    let call = graph.edges_from(&f_id, EdgeKind::Calls).find(|e| e.target == g_id).unwrap();
    match &call.props {
        EdgeProps::Calls { confidence } => assert_eq!(*confidence, Confidence::UNIQUE_LOCAL),
        _ => panic!("expected Calls props"),
    }

    let import = graph
        .edges_from(&NodeId::file("a.py"), EdgeKind::Imports)
        .find(|e| e.target == NodeId::file("b.py"))
        .unwrap();
    match &import.props {
        EdgeProps::Imports { symbols } => assert_eq!(symbols, &vec!["g".to_string()]),
        _ => panic!("expected Imports props"),
    }
}

/// Scenario 2: C# self-call disambiguation via a typed field receiver —
/// `_repo.GetAll()` binds to `IUserRepository.GetAll`, not a self-loop onto
/// `UserService.GetAll`.
#[test]
fn self_call_disambiguation_avoids_self_loop() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("UserService.cs"),
        r#"
interface IUserRepository {
    User GetAll();
}

class UserService {
    private readonly IUserRepository _repo;
    public User GetAll() {
        _repo.GetAll();
    }
}
"#,
    )
    .unwrap();

    let outcome = run(&dir);
    let graph = &outcome.graph;

    let caller_id = NodeId::symbol(NodeKind::Method, "UserService.cs", "UserService.GetAll");
    let callee_id = NodeId::symbol(NodeKind::Method, "UserService.cs", "IUserRepository.GetAll");

    assert!(graph.has_edge(&caller_id, &callee_id, EdgeKind::Calls));
    assert!(!graph.has_edge(&caller_id, &caller_id, EdgeKind::Calls));

    let call = graph.edges_from(&caller_id, EdgeKind::Calls).find(|e| e.target == callee_id).unwrap();
    match &call.props {
        EdgeProps::Calls { confidence } => assert_eq!(*confidence, Confidence::RECEIVER_TYPED),
        _ => panic!("expected Calls props"),
    }
}

/// Scenario 3: a Python route handler with no callers is exempt from
/// dead-code flagging, becomes an entry point, and roots a Process.
#[test]
fn decorated_route_handler_is_exempt_and_becomes_a_process_root() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("app.py"),
        "@app.route(\"/x\")\ndef handler():\n    helper()\n\ndef helper():\n    pass\n",
    )
    .unwrap();

    let outcome = run(&dir);
    let graph = &outcome.graph;

    let handler_id = NodeId::symbol(NodeKind::Function, "app.py", "handler");
    let symbol = graph.node(&handler_id).unwrap().as_symbol().unwrap();
    assert!(!symbol.is_dead);

    let processes: Vec<_> = graph.nodes_of_kind(NodeKind::Process).collect();
    assert_eq!(processes.len(), 1);
    let step_zero = graph
        .edges_to(&processes[0].id, EdgeKind::StepInProcess)
        .find(|e| matches!(&e.props, EdgeProps::StepInProcess { step_number } if *step_number == 0))
        .unwrap();
    assert_eq!(step_zero.source, handler_id);
}

/// Scenario 4: an interface method with no implementers is never flagged
/// dead (protocol-stub exemption, pass 5).
#[test]
fn unimplemented_interface_stub_is_never_dead() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("IUserService.cs"), "interface IUserService {\n    User GetUser(int id);\n}\n").unwrap();

    let outcome = run(&dir);
    let graph = &outcome.graph;

    let method_id = NodeId::symbol(NodeKind::Method, "IUserService.cs", "IUserService.GetUser");
    let symbol = graph.node(&method_id).unwrap().as_symbol().unwrap();
    assert!(matches!(&symbol.detail, SymbolDetail::Method { is_stub: true, .. }));
    assert!(!symbol.is_dead);
}

/// Scenario 6: a typo'd call resolves fuzzily to the one function it's an
/// edit distance of 1 away from.
#[test]
fn fuzzy_call_resolves_with_reduced_confidence() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("a.py"),
        "def validate_user():\n    pass\n\ndef check():\n    validte_user()\n",
    )
    .unwrap();

    let outcome = run(&dir);
    let graph = &outcome.graph;

    let caller_id = NodeId::symbol(NodeKind::Function, "a.py", "check");
    let callee_id = NodeId::symbol(NodeKind::Function, "a.py", "validate_user");
    let call = graph.edges_from(&caller_id, EdgeKind::Calls).find(|e| e.target == callee_id).unwrap();
    match &call.props {
        EdgeProps::Calls { confidence } => assert_eq!(*confidence, Confidence::FUZZY),
        _ => panic!("expected Calls props"),
    }
}

/// Invariant 4: USES_TYPE carries a role and one edge per (src, dst, role).
#[test]
fn uses_type_edges_carry_distinct_roles() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("models.py"),
        "class User:\n    pass\n\ndef f(u: User) -> User:\n    pass\n",
    )
    .unwrap();

    let outcome = run(&dir);
    let graph = &outcome.graph;

    let f_id = NodeId::symbol(NodeKind::Function, "models.py", "f");
    let user_id = NodeId::symbol(NodeKind::Class, "models.py", "User");
    let roles: Vec<TypeRole> = graph
        .edges_from(&f_id, EdgeKind::UsesType)
        .filter(|e| e.target == user_id)
        .filter_map(|e| match &e.props {
            EdgeProps::UsesType { role } => Some(*role),
            _ => None,
        })
        .collect();
    assert!(roles.contains(&TypeRole::Param));
    assert!(roles.contains(&TypeRole::Return));
}

/// Boundary: an empty repository yields an empty graph and pipeline success.
#[test]
fn empty_repo_yields_empty_graph() {
    let dir = TempDir::new().unwrap();
    let outcome = run(&dir);
    assert_eq!(outcome.graph.symbols().count(), 0);
}

/// Boundary: a file with unparseable content is kept with `parse_failed=true`
/// and zero symbols, without failing the run.
#[test]
fn unparseable_file_is_kept_with_parse_failed_flag() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("broken.py"), "def f(:\n").unwrap();

    let outcome = run(&dir);
    let graph = &outcome.graph;

    let file = graph.node(&NodeId::file("broken.py")).unwrap().as_file().unwrap();
    assert!(file.parse_failed);
    assert_eq!(graph.symbols().count(), 0);
}

/// Boundary: no version-control history means zero COUPLED_WITH edges, and
/// the run still succeeds.
#[test]
fn no_vcs_history_yields_zero_coupling_edges() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

    let outcome = run(&dir);
    assert_eq!(outcome.graph.edges().iter().filter(|e| e.kind == EdgeKind::CoupledWith).count(), 0);
}

/// A cancellation requested before the run starts surfaces as
/// `PipelineError::Cancelled` rather than a partial graph.
#[test]
fn cancellation_is_observed_before_any_phase_runs() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(Settings::default());
    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let result = pipeline.run(dir.path(), &cancellation);
    assert!(matches!(result, Err(axon::error::PipelineError::Cancelled { phase }) if phase == "walk"));
}

fn commit_files(repo: &git2::Repository, sig: &git2::Signature, message: &str, paths: &[&str]) {
    let mut index = repo.index().unwrap();
    for path in paths {
        index.add_path(std::path::Path::new(path)).unwrap();
    }
    let tree_id = index.write_tree().unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), sig, sig, message, &tree, &parents).unwrap();
}

/// Scenario 5: A and B co-change often enough, relative to A's total
/// change count, to clear the default 0.3 strength threshold and get a
/// COUPLED_WITH edge. A and C co-change too rarely relative to A's total
/// changes and stay below the threshold, so no edge is emitted for that
/// pair.
#[test]
fn coupling_threshold_gates_on_strength() {
    let dir = TempDir::new().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    let sig = git2::Signature::now("Test", "test@example.com").unwrap();

    std::fs::write(dir.path().join("a.py"), "x = 0\n").unwrap();
    std::fs::write(dir.path().join("b.py"), "y = 0\n").unwrap();
    std::fs::write(dir.path().join("c.py"), "z = 0\n").unwrap();
    commit_files(&repo, &sig, "initial", &["a.py", "b.py", "c.py"]);

    // 3 commits touch both a.py and b.py.
    for i in 0..3 {
        std::fs::write(dir.path().join("a.py"), format!("x = {i}\n")).unwrap();
        std::fs::write(dir.path().join("b.py"), format!("y = {i}\n")).unwrap();
        commit_files(&repo, &sig, &format!("a+b co-change {i}"), &["a.py", "b.py"]);
    }
    // 2 further commits touch both a.py and c.py (below min_co_changes=3).
    for i in 0..2 {
        std::fs::write(dir.path().join("a.py"), format!("x = {}\n", 10 + i)).unwrap();
        std::fs::write(dir.path().join("c.py"), format!("z = {i}\n")).unwrap();
        commit_files(&repo, &sig, &format!("a+c co-change {i}"), &["a.py", "c.py"]);
    }
    // a.py-only commits bring its total change count to 10.
    for i in 0..5 {
        std::fs::write(dir.path().join("a.py"), format!("x = {}\n", 20 + i)).unwrap();
        commit_files(&repo, &sig, &format!("a solo {i}"), &["a.py"]);
    }

    let outcome = run(&dir);
    let graph = &outcome.graph;

    assert!(graph.has_edge(&NodeId::file("a.py"), &NodeId::file("b.py"), EdgeKind::CoupledWith));
    assert!(!graph.has_edge(&NodeId::file("a.py"), &NodeId::file("c.py"), EdgeKind::CoupledWith));
}
