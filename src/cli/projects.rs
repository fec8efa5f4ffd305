use crate::api::models::NewProject;
use crate::api::ProjectsApi;
use crate::app::App;
use crate::error::Result;

use super::{print_json, ProjectCommands};

pub async fn run(app: &App, action: ProjectCommands) -> Result<()> {
    let api = ProjectsApi::new(&app.client);
    match action {
        ProjectCommands::List => {
            let projects = api.list().await?;
            if projects.is_empty() {
                println!("No projects.");
                return Ok(());
            }
            for project in &projects {
                println!("{}  {}", project.id, project.name);
            }
            println!("\n{} project(s)", projects.len());
            Ok(())
        }
        ProjectCommands::Create { name, description } => {
            let project = api.create(&NewProject { name, description }).await?;
            eprintln!("tms: created project {}", project.id);
            print_json(&project)
        }
    }
}
