mod support;

use global_nav_deploy::core::input::DeploymentInputs;
use global_nav_deploy::core::provider::serialize_template;
use global_nav_deploy::core::workflow::{DONE_PAUSE, EDIT_TEMPLATE_PAUSE};
use global_nav_deploy::domain::model::NavigationKind;
use global_nav_deploy::domain::template::{
    Navigation, NavigationNode, NavigationSection, ProvisioningTemplate,
};
use global_nav_deploy::{
    DeployConfig, DeployError, DeployWorkflow, FailurePolicy, LocalStorage,
};
use support::{credentials, site_row, FakeSharePoint, FakeSite, ScriptedPrompter, PASSWORD};
use tempfile::TempDir;

const TEMPLATE_SITE: &str = "https://contoso.sharepoint.com/sites/template";
const INFRA: &str = "https://contoso.sharepoint.com/sites/infra";
const FINANCE: &str = "https://contoso.sharepoint.com/sites/finance";
const LEGAL: &str = "https://contoso.sharepoint.com/sites/legal";

fn global_nodes() -> Vec<NavigationNode> {
    vec![
        NavigationNode::new("Home", "https://contoso.sharepoint.com"),
        NavigationNode::new("Policies", "https://contoso.sharepoint.com/sites/policies"),
    ]
}

fn tenant() -> FakeSharePoint {
    let mut template = ProvisioningTemplate::new("TEMPLATE-20240301120000");
    template.navigation = Some(Navigation {
        global: Some(NavigationSection::structural(global_nodes())),
        current: None,
    });
    let uploaded = serialize_template(&template).unwrap();

    let fake = FakeSharePoint::new();
    fake.add_site(TEMPLATE_SITE, FakeSite::new("Template"));
    fake.seed_navigation(TEMPLATE_SITE, NavigationKind::TopNavigationBar, &global_nodes());
    fake.seed_navigation(
        TEMPLATE_SITE,
        NavigationKind::QuickLaunch,
        &[NavigationNode::new("Documents", "/sites/template/Shared Documents")],
    );
    fake.add_site(
        INFRA,
        FakeSite::new("Infrastructure")
            .with_list(
                "GlobalNavSites",
                vec![
                    site_row("Finance", true, FINANCE),
                    site_row("Legal", false, LEGAL),
                ],
            )
            .with_file("ProvisioningTemplates", "GlobalNav.xml", &uploaded),
    );
    fake.add_site(FINANCE, FakeSite::new("Finance"));
    fake.add_site(LEGAL, FakeSite::new("Legal"));
    fake
}

fn config(work_dir: &TempDir) -> DeployConfig {
    let mut config = DeployConfig::default();
    config.artifacts.work_dir = work_dir.path().to_path_buf();
    config
}

#[tokio::test]
async fn test_full_run_with_prompted_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let fake = tenant();
    let prompter = ScriptedPrompter::new(&[
        TEMPLATE_SITE,
        "https://contoso.sharepoint.com/sites/unused",
        INFRA,
        "admin@contoso.com",
        PASSWORD,
    ]);
    let workflow = DeployWorkflow::new(
        fake.clone(),
        LocalStorage::new(temp_dir.path()),
        prompter,
        config(&temp_dir),
    );

    let summary = workflow.run().await.unwrap();

    assert_eq!(summary.extracted.site_title, "Template");
    assert_eq!(summary.sites.len(), 1);
    assert_eq!(summary.sites[0].url, FINANCE);
    assert_eq!(summary.report.succeeded(), 1);
    assert_eq!(summary.report.failed(), 0);

    assert!(temp_dir.path().join("PnPProvisioningDemo.xml").exists());
    assert!(temp_dir.path().join("GlobalNav.xml").exists());

    assert_eq!(fake.navigation(FINANCE, NavigationKind::TopNavigationBar), global_nodes());
    assert!(fake.navigation(LEGAL, NavigationKind::TopNavigationBar).is_empty());
    assert!(!fake.calls().iter().any(|c| c.contains("/sites/unused")));
}

#[tokio::test]
async fn test_pauses_happen_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new(&[
        TEMPLATE_SITE,
        "",
        INFRA,
        "admin@contoso.com",
        PASSWORD,
    ]);
    let workflow = DeployWorkflow::new(
        tenant(),
        LocalStorage::new(temp_dir.path()),
        &prompter,
        config(&temp_dir),
    );

    workflow.run().await.unwrap();

    assert_eq!(
        *prompter.pauses.borrow(),
        vec![EDIT_TEMPLATE_PAUSE.to_string(), DONE_PAUSE.to_string()]
    );
}

#[tokio::test]
async fn test_pauses_can_be_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new(&[]);
    let mut config = config(&temp_dir);
    config.deploy.pause_before_apply = false;
    config.deploy.pause_on_exit = false;

    let workflow = DeployWorkflow::new(
        tenant(),
        LocalStorage::new(temp_dir.path()),
        &prompter,
        config,
    );
    let inputs = DeploymentInputs {
        template_site_url: TEMPLATE_SITE.to_string(),
        target_site_url: String::new(),
        infrastructure_url: INFRA.to_string(),
        credentials: credentials(),
    };
    workflow.run_with_inputs(&inputs).await.unwrap();

    assert!(prompter.pauses.borrow().is_empty());
}

#[tokio::test]
async fn test_wrong_password_stops_before_any_write() {
    let temp_dir = TempDir::new().unwrap();
    let fake = tenant();
    let prompter = ScriptedPrompter::new(&[
        TEMPLATE_SITE,
        "",
        INFRA,
        "admin@contoso.com",
        "wrong",
    ]);
    let workflow = DeployWorkflow::new(
        fake.clone(),
        LocalStorage::new(temp_dir.path()),
        prompter,
        config(&temp_dir),
    );

    let result = workflow.run().await;

    assert!(matches!(result, Err(DeployError::AuthenticationError { .. })));
    assert!(!temp_dir.path().join("PnPProvisioningDemo.xml").exists());
    assert!(fake.navigation(FINANCE, NavigationKind::TopNavigationBar).is_empty());
}

#[tokio::test]
async fn test_continue_policy_reports_failed_sites() {
    let temp_dir = TempDir::new().unwrap();
    let fake = tenant();
    fake.add_site(
        INFRA,
        FakeSite::new("Infrastructure")
            .with_list(
                "GlobalNavSites",
                vec![
                    site_row("Missing", true, "https://contoso.sharepoint.com/sites/missing"),
                    site_row("Finance", true, FINANCE),
                ],
            )
            .with_file(
                "ProvisioningTemplates",
                "GlobalNav.xml",
                &std::fs::read_to_string(
                    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
                        .join("tests/fixtures/GlobalNav.xml"),
                )
                .unwrap(),
            ),
    );
    let mut config = config(&temp_dir);
    config.deploy.on_site_failure = FailurePolicy::Continue;
    let prompter = ScriptedPrompter::new(&[]);
    let inputs = DeploymentInputs {
        template_site_url: TEMPLATE_SITE.to_string(),
        target_site_url: String::new(),
        infrastructure_url: INFRA.to_string(),
        credentials: credentials(),
    };

    let workflow = DeployWorkflow::new(
        fake.clone(),
        LocalStorage::new(temp_dir.path()),
        &prompter,
        config,
    );
    let summary = workflow.run_with_inputs(&inputs).await.unwrap();

    assert_eq!(summary.report.succeeded(), 1);
    assert_eq!(summary.report.failed(), 1);
    let navigation = fake.navigation(FINANCE, NavigationKind::TopNavigationBar);
    assert_eq!(navigation.len(), 1);
    assert_eq!(navigation[0].title, "Intranet");
    assert_eq!(navigation[0].children.len(), 1);
}
