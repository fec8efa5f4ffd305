use crate::api::models::{NewTestPlan, PageRequest, TestPlanUpdate};
use crate::api::TestPlansApi;
use crate::app::App;
use crate::error::Result;

use super::{print_json, truncate, PlanCommands};

pub async fn run(app: &App, action: PlanCommands) -> Result<()> {
    let api = TestPlansApi::new(&app.client);
    match action {
        PlanCommands::List { project, page } => {
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
                println!("No test plans.");
                return Ok(());
            }
            for plan in &listing.data {
                println!(
                    "{}  [{}]  {}  {}",
                    plan.id,
                    if plan.status.is_empty() { "-" } else { plan.status.as_str() },
                    plan.name,
                    truncate(&plan.description, 60),
                );
            }
            println!(
                "\npage {} ({} per page), {} total",
                listing.page, listing.size, listing.total
            );
            Ok(())
        }
        PlanCommands::Get { id } => print_json(&api.get(&id).await?),
        PlanCommands::Create {
            project,
            name,
            description,
            deadline,
        } => {
            let plan = api
                .create(&NewTestPlan {
                    project_id: project,
                    name,
                    description,
                    deadline,
                })
                .await?;
            eprintln!("tms: created test plan {}", plan.id);
            print_json(&plan)
        }
        PlanCommands::Update {
            id,
            name,
            description,
            deadline,
            status,
        } => {
            let update = TestPlanUpdate {
                name,
                description,
                deadline,
                status,
            };
            let plan = api.update(&id, &update).await?;
            eprintln!("tms: updated test plan {}", plan.id);
            print_json(&plan)
        }
        PlanCommands::AddCase { plan_id, case_id } => {
            let ack = api.add_test_case(&plan_id, &case_id).await?;
            if ack.message.is_empty() {
                eprintln!("tms: added test case {case_id} to plan {plan_id}");
            } else {
                eprintln!("tms: {}", ack.message);
            }
            Ok(())
        }
    }
}
