use super::*;

#[test]
fn location_hrefs_are_fixed_filenames() {
    assert_eq!(Location::Login.href(), "login.html");
    assert_eq!(Location::Dashboard.href(), "dashboard.html");
    assert_eq!(Location::Dashboard.to_string(), "dashboard.html");
}

#[test]
fn terminal_page_writes_effects_in_order() {
    let page = TerminalPage::new(Vec::new());
    page.alert("You have been logged out.");
    page.render("Welcome, alice!");
    page.navigate(Location::Login);

    assert_eq!(page.location(), Some(Location::Login));
    let written = String::from_utf8(page.into_inner()).unwrap();
    assert_eq!(written, "[alert] You have been logged out.\nWelcome, alice!\n-> login.html\n");
}

#[test]
fn terminal_page_starts_without_location() {
    let page = TerminalPage::new(Vec::new());
    assert_eq!(page.location(), None);
}
