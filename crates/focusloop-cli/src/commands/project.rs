//! Project management commands for CLI.

use clap::Subcommand;
use focusloop_core::{Project, TaskStatus};

use super::{print_events, print_json, short_id, CmdResult, Workspace};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project and make it active
    Create {
        /// Project title
        title: String,
        /// Budget days (8 hours each)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        days: i64,
        /// Additional budget hours
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        hours: i64,
    },
    /// List all projects
    List {
        #[arg(long)]
        json: bool,
    },
    /// Make a project active
    Select {
        /// Project id or unique prefix
        id: String,
    },
    /// Delete a project and all its tasks
    Delete {
        /// Project id or unique prefix
        id: String,
    },
    /// Show the active project's board
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Credit focus minutes to the active project by hand
    AddTime {
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },
}

pub fn run(action: ProjectAction) -> CmdResult {
    let mut ws = Workspace::open()?;
    if !matches!(action, ProjectAction::List { .. } | ProjectAction::Show { .. }) {
        print_events(&ws.take_caught_up())?;
    }

    match action {
        ProjectAction::Create { title, days, hours } => {
            let id = ws.session.create_project(&title, days, hours)?;
            println!("Project created: {id}");
        }
        ProjectAction::List { json } => {
            if json {
                print_json(ws.session.projects())?;
            } else {
                let active = ws.session.active_project_id();
                for project in ws.session.projects() {
                    let marker = if Some(project.id.as_str()) == active { "*" } else { " " };
                    let usage = project.budget_usage();
                    println!(
                        "{marker} {}  {:<24} {:>5.1}h / {:.1}h  {} tasks",
                        short_id(&project.id),
                        project.title,
                        usage.spent_hours,
                        usage.total_hours,
                        project.tasks.len()
                    );
                }
            }
        }
        ProjectAction::Select { id } => {
            let id = ws.project_id(&id)?;
            ws.session.select_project(&id)?;
            println!("Active project: {id}");
        }
        ProjectAction::Delete { id } => {
            let id = ws.project_id(&id)?;
            let events = ws.session.delete_project(&id)?;
            print_events(&events)?;
            println!("Project deleted: {id}");
        }
        ProjectAction::Show { json } => {
            let project = ws.session.active_project().ok_or("no active project")?;
            if json {
                print_json(project)?;
            } else {
                print_board(project, ws.session.active_task_id());
            }
        }
        ProjectAction::AddTime { minutes } => {
            match ws.session.add_time_budget(minutes)? {
                Some(event) => print_json(&event)?,
                None => println!("nothing to add"),
            }
        }
    }

    ws.save()?;
    Ok(())
}

fn print_board(project: &Project, focused: Option<&str>) {
    let usage = project.budget_usage();
    println!("{}", project.title);
    println!(
        "Spent {:.1}h of {:.1}h ({:.0}%){}",
        usage.spent_hours,
        usage.total_hours,
        usage.percent_used,
        if usage.near_limit { "  near budget limit" } else { "" }
    );
    for status in TaskStatus::ALL {
        let column = project.column(status);
        println!();
        println!("{} ({})", status.label(), column.len());
        for task in column {
            let (done, total) = task.subtask_progress();
            let checklist = if total > 0 { format!(" [{done}/{total}]") } else { String::new() };
            let focus = if Some(task.id.as_str()) == focused { " <- focus" } else { "" };
            println!("  {}  {}{checklist}{focus}", short_id(&task.id), task.title);
        }
    }
}
