/*!
Command layer.

One file per mode, plus the pieces they share:

  src/cmd/
    mod.rs            (this file)
    dispatch.rs       (mode flags, argument validation, Operation + run)
    generate_link.rs  (GenerateLinkArgs + execute_generate_link)
    execute_tool.rs   (ExecuteToolArgs  + execute_execute_tool)
    proxy_request.rs  (ProxyRequestArgs + execute_proxy_request)
    get_tool.rs       (GetToolArgs      + execute_get_tool)
    shared.rs         (Session, banner, account + authorization flow)
    confirm.rs        (Operator seam for the "press Enter" step)
    format.rs         (color / emoji / JSON / truncation helpers)
    error.rs          (Outcome + CommandError)

Conventions:
  - Each mode module exposes exactly one public `execute_*` function
    returning `Result<Outcome, CommandError>`.
  - Handlers write to `Session::out` and never exit the process;
    `main.rs` maps the result onto the exit code.
*/

pub mod confirm;
pub mod dispatch;
pub mod error;
pub mod execute_tool;
pub mod format;
pub mod generate_link;
pub mod get_tool;
pub mod proxy_request;
pub mod shared;

#[cfg(test)]
pub(crate) mod testing;

pub use confirm::StdinOperator;
pub use dispatch::{ModeFlags, OperationArgs, interruptible, resolve, run};
pub use error::{CommandError, Outcome};
pub use format::StyleOptions;
pub use shared::{Session, print_banner};
