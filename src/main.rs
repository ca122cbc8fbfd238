use std::process::ExitCode;

use desk_organizer::output as out;
use desk_organizer::OrganizerError;

mod app;

fn main() -> ExitCode {
    match app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            let code = e
                .downcast_ref::<OrganizerError>()
                .map(OrganizerError::code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
