pub const APP_TITLE: &str = " DRHP to IPO Notes ";
pub const TITLE_PREVIEW: &str = " DRHP ";
pub const TITLE_DIRECTORY: &str = " Companies ";
pub const TITLE_GENERATED: &str = " IPO Notes ";
pub const HELP_MAIN: &str =
    " o:open  g:generate  x:remove  s/S:save  PgUp/PgDn,[/]:scroll  c/C:cancel  j/k:move  Enter:open  D:delete  r:regenerate  R:refresh  l/e:logo  q:quit";
pub const HELP_PROMPT: &str = " Type or drop a path, Enter to submit, Esc to cancel";
pub const DIALOG_WIDTH: u16 = 60;
pub const DIALOG_HEIGHT: u16 = 7;
