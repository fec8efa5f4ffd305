use crate::api::models::{NewTestCase, PageRequest, TestCaseUpdate, TestStep};
use crate::api::TestCasesApi;
use crate::app::App;
use crate::error::Result;

use super::{print_json, truncate, CaseCommands};

pub async fn run(app: &App, action: CaseCommands) -> Result<()> {
    let api = TestCasesApi::new(&app.client);
    match action {
        CaseCommands::List { project, page } => {
            let listing = api
                .list(
                    &project,
                    PageRequest {
                        page: page.page,
                        size: page.size,
                    },
                )
                .await?;

            if listing.data.is_empty() {
                println!("No test cases.");
                return Ok(());
            }
            for case in &listing.data {
                println!(
                    "{}  {}  ({} steps)  {}",
                    case.id,
                    case.title,
                    case.steps.len(),
                    truncate(&case.description, 60),
                );
            }
            println!(
                "\npage {} ({} per page), {} total",
                listing.page, listing.size, listing.total
            );
            Ok(())
        }
        CaseCommands::Get { id } => print_json(&api.get(&id).await?),
        CaseCommands::Create {
            project,
            title,
            description,
            pre_steps,
            expected_result,
            steps,
        } => {
            let case = api
                .create(&NewTestCase {
                    project_id: project,
                    title,
                    description,
                    pre_steps,
                    steps: numbered_steps(steps),
                    expected_result,
                })
                .await?;
            eprintln!("tms: created test case {}", case.id);
            print_json(&case)
        }
        CaseCommands::Update {
            id,
            title,
            description,
            pre_steps,
            expected_result,
        } => {
            let update = TestCaseUpdate {
                title,
                description,
                pre_steps,
                steps: None,
                expected_result,
            };
            let case = api.update(&id, &update).await?;
            eprintln!("tms: updated test case {}", case.id);
            print_json(&case)
        }
    }
}

fn numbered_steps(descriptions: Vec<String>) -> Vec<TestStep> {
    descriptions
        .into_iter()
        .enumerate()
        .map(|(i, description)| TestStep {
            id: None,
            description,
            expected_result: String::new(),
            order: i as i32 + 1,
        })
        .collect()
}
