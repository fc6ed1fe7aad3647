use clap::Subcommand;

use super::{print_events, CmdResult, Workspace};

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Add a checklist item to a task
    Add {
        /// Task id or unique prefix
        task: String,
        /// Subtask title
        title: String,
    },
    /// Flip a checklist item between open and completed
    Toggle {
        task: String,
        subtask: String,
    },
    /// Remove a checklist item
    Delete {
        task: String,
        subtask: String,
    },
}

pub fn run(action: SubtaskAction) -> CmdResult {
    let mut ws = Workspace::open()?;
    print_events(&ws.take_caught_up())?;

    match action {
        SubtaskAction::Add { task, title } => {
            let task = ws.task_id(&task)?;
            let id = ws.session.add_subtask(&task, &title)?;
            println!("Subtask created: {id}");
        }
        SubtaskAction::Toggle { task, subtask } => {
            let task = ws.task_id(&task)?;
            let subtask = ws.subtask_id(&task, &subtask)?;
            let completed = ws.session.toggle_subtask(&task, &subtask)?;
            println!("{}", if completed { "completed" } else { "open" });
        }
        SubtaskAction::Delete { task, subtask } => {
            let task = ws.task_id(&task)?;
            let subtask = ws.subtask_id(&task, &subtask)?;
            ws.session.delete_subtask(&task, &subtask)?;
            println!("Subtask deleted: {subtask}");
        }
    }

    ws.save()?;
    Ok(())
}
