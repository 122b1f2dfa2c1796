use crate::internal::ui::app::Action;
use crate::internal::ui::keybindings::{KeyBindingContext, KeyBindingMap};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Create default keybindings for the application
pub fn create_default_keybindings() -> KeyBindingMap {
    let mut map = KeyBindingMap::new();

    add_global_bindings(&mut map);
    add_list_bindings(&mut map);
    add_detail_bindings(&mut map);

    map
}

fn add_global_bindings(map: &mut KeyBindingMap) {
    let ctx = KeyBindingContext::Global;

    map.add_binding(ctx, key('?'), Action::ToggleHelp);

    map.add_binding(ctx, key('q'), Action::Back);
    map.add_binding(ctx, key_code(KeyCode::Esc), Action::Back);

    map.add_binding(ctx, key('j'), Action::NavigateDown);
    map.add_binding(ctx, key('k'), Action::NavigateUp);
    map.add_binding(ctx, key_code(KeyCode::Down), Action::NavigateDown);
    map.add_binding(ctx, key_code(KeyCode::Up), Action::NavigateUp);

    map.add_binding(ctx, key_code(KeyCode::Enter), Action::Enter);
    map.add_binding(ctx, key('o'), Action::OpenBrowser);
}

fn add_list_bindings(map: &mut KeyBindingMap) {
    let ctx = KeyBindingContext::List;

    map.add_binding(ctx, key('q'), Action::Quit);
    // Esc on the list only closes the error banner
    map.add_binding(ctx, key_code(KeyCode::Esc), Action::DismissBanner);

    map.add_binding(ctx, key('r'), Action::Refresh);

    // Paging
    map.add_binding(ctx, key('n'), Action::NextPage);
    map.add_binding(ctx, key('p'), Action::PrevPage);
    map.add_binding(ctx, key_code(KeyCode::Right), Action::NextPage);
    map.add_binding(ctx, key_code(KeyCode::Left), Action::PrevPage);

    // Filters
    map.add_binding(ctx, key('c'), Action::CycleCategory);
    map.add_binding(ctx, key('s'), Action::CycleSource);
    map.add_binding(ctx, key('f'), Action::EditDateFrom);
    map.add_binding(ctx, key('t'), Action::EditDateTo);
    map.add_binding(ctx, key('/'), Action::EditKeyword);
    map.add_binding(ctx, key('x'), Action::ClearFilters);

    // Collection
    map.add_binding(ctx, key('C'), Action::CollectNow);
    map.add_binding(ctx, key('H'), Action::CollectHistorical);
}

fn add_detail_bindings(map: &mut KeyBindingMap) {
    let ctx = KeyBindingContext::Detail;

    map.add_binding(ctx, key('j'), Action::ScrollDown);
    map.add_binding(ctx, key('k'), Action::ScrollUp);
    map.add_binding(ctx, key_code(KeyCode::Down), Action::ScrollDown);
    map.add_binding(ctx, key_code(KeyCode::Up), Action::ScrollUp);
    map.add_binding(ctx, key_code(KeyCode::Backspace), Action::Back);
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty())
}

fn key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
}
