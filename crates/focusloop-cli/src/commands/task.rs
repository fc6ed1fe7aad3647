use clap::Subcommand;
use focusloop_core::TaskStatus;

use super::{print_events, print_json, short_id, CmdResult, Workspace};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the active project's To Do column
    Add {
        /// Task title
        title: String,
    },
    /// List tasks of the active project by column
    List {
        #[arg(long)]
        json: bool,
    },
    /// Set a task's status without moving it
    Status {
        /// Task id or unique prefix
        id: String,
        /// todo, in-progress or done
        status: TaskStatus,
    },
    /// Move a task to a column position
    Move {
        /// Task id or unique prefix
        id: String,
        /// Destination column: todo, in-progress or done
        status: TaskStatus,
        /// Position in the destination column; appends when omitted
        #[arg(long)]
        index: Option<usize>,
    },
    /// Delete a task
    Delete {
        /// Task id or unique prefix
        id: String,
    },
    /// Attach the focus timer to a task
    Focus {
        /// Task id or unique prefix
        id: String,
    },
    /// Detach the focus timer from its task
    Unfocus,
    /// Show the focused task
    Current,
}

pub fn run(action: TaskAction) -> CmdResult {
    let mut ws = Workspace::open()?;
    // Keep listing output parseable; the catch-up is still saved below.
    if !matches!(action, TaskAction::List { .. } | TaskAction::Current) {
        print_events(&ws.take_caught_up())?;
    }

    match action {
        TaskAction::Add { title } => {
            let id = ws.session.add_task(&title)?;
            println!("Task created: {id}");
        }
        TaskAction::List { json } => {
            let project = ws.session.active_project().ok_or("no active project")?;
            if json {
                print_json(&project.tasks)?;
            } else {
                for status in TaskStatus::ALL {
                    for task in project.column(status) {
                        println!("{:<12} {}  {}", status.as_str(), short_id(&task.id), task.title);
                    }
                }
            }
        }
        TaskAction::Status { id, status } => {
            let id = ws.task_id(&id)?;
            let events = ws.session.update_task_status(&id, status)?;
            print_events(&events)?;
            println!("Task {} is now {status}", short_id(&id));
        }
        TaskAction::Move { id, status, index } => {
            let id = ws.task_id(&id)?;
            let target = index.map_or(-1, |i| i64::try_from(i).unwrap_or(i64::MAX));
            let events = ws.session.move_task(&id, status, target)?;
            print_events(&events)?;
        }
        TaskAction::Delete { id } => {
            let id = ws.task_id(&id)?;
            let events = ws.session.delete_task(&id)?;
            print_events(&events)?;
            println!("Task deleted: {id}");
        }
        TaskAction::Focus { id } => {
            let id = ws.task_id(&id)?;
            let events = ws.session.start_focus(&id)?;
            print_events(&events)?;
        }
        TaskAction::Unfocus => {
            let events = ws.session.clear_active_task();
            if events.is_empty() {
                println!("no focused task");
            }
            print_events(&events)?;
        }
        TaskAction::Current => {
            match ws.session.active_task() {
                Some(task) => print_json(task)?,
                None => println!("no focused task"),
            }
        }
    }

    ws.save()?;
    Ok(())
}
