pub mod cat;
pub mod ls;
pub mod watch;

use crate::cli::op::Op;

crate::command_enum! {
    (Watch, watch::Watch),
    (Ls, ls::Ls),
    (Cat, cat::Cat),
}
