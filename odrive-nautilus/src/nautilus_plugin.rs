#![allow(unsafe_op_in_unsafe_fn)]

use super::*;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use gio::prelude::*;
use glib_sys::{GFALSE, GList, GType, g_free, g_list_append, gboolean, gpointer};
use gobject_sys::{
    GInterfaceInfo, GObject, GObjectClass, GTypeInfo, GTypeInterface, GTypeModule,
    g_object_get_type, g_object_set, g_object_unref, g_signal_connect_data,
    g_type_module_add_interface, g_type_module_register_type,
};
use gtk4::prelude::*;
use odrive_integrations::ids::{
    CUSTOM_ICON_ATTRIBUTE, CUSTOM_ICON_NAME_ATTRIBUTE, EMBLEMS_ATTRIBUTE, EXTENSION_TYPE_NAME,
    MENU_NAME_PREFIX, MODIFIED_TIME_ATTRIBUTE,
};

#[repr(C)]
struct NautilusFileInfo {
    _private: [u8; 0],
}

#[repr(C)]
struct NautilusMenuItem {
    _private: [u8; 0],
}

#[repr(C)]
struct NautilusMenu {
    _private: [u8; 0],
}

#[repr(C)]
struct NautilusMenuProvider {
    _private: [u8; 0],
}

#[repr(C)]
struct NautilusMenuProviderInterface {
    g_iface: GTypeInterface,
    get_file_items: Option<
        unsafe extern "C" fn(provider: *mut NautilusMenuProvider, files: *mut GList) -> *mut GList,
    >,
    get_background_items: Option<
        unsafe extern "C" fn(
            provider: *mut NautilusMenuProvider,
            current_folder: *mut NautilusFileInfo,
        ) -> *mut GList,
    >,
}

#[link(name = "nautilus-extension")]
unsafe extern "C" {
    fn nautilus_menu_provider_get_type() -> GType;

    fn nautilus_file_info_get_uri(file_info: *mut NautilusFileInfo) -> *mut c_char;
    fn nautilus_file_info_is_directory(file_info: *mut NautilusFileInfo) -> gboolean;
    fn nautilus_file_info_is_gone(file_info: *mut NautilusFileInfo) -> gboolean;
    fn nautilus_file_info_invalidate_extension_info(file_info: *mut NautilusFileInfo);
    fn nautilus_file_info_lookup_for_uri(uri: *const c_char) -> *mut NautilusFileInfo;

    fn nautilus_menu_item_new(
        name: *const c_char,
        label: *const c_char,
        tip: *const c_char,
        icon: *const c_char,
    ) -> *mut NautilusMenuItem;
    fn nautilus_menu_item_set_submenu(item: *mut NautilusMenuItem, menu: *mut NautilusMenu);
    fn nautilus_menu_new() -> *mut NautilusMenu;
    fn nautilus_menu_append_item(menu: *mut NautilusMenu, item: *mut NautilusMenuItem);
}

#[derive(Clone)]
struct ActionContext {
    action: MenuAction,
    targets: Vec<PathBuf>,
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();
static CLI: OnceLock<Option<OdriveCli>> = OnceLock::new();
static ACTION_CONTEXTS: OnceLock<Mutex<HashMap<usize, ActionContext>>> = OnceLock::new();
static REGISTERED_TYPE: AtomicUsize = AtomicUsize::new(0);
static REGISTERED_TYPES: OnceLock<[GType; 1]> = OnceLock::new();

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nautilus_module_initialize(module: *mut GTypeModule) {
    if module.is_null() {
        return;
    }
    init_logging();
    mark_gtk_initialized();
    let registered = ensure_registered_type(module);
    let _ = REGISTERED_TYPES.set([registered]);
    match odrive_cli() {
        Some(cli) => tracing::info!(cli = %cli.program().display(), "odrive extension loaded"),
        None => tracing::warn!("odrive CLI not found, menu will be disabled"),
    }
    let _ = action_contexts();
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nautilus_module_shutdown() {
    tracing::debug!("odrive extension shutting down");
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nautilus_module_list_types(
    types: *mut *const GType,
    num_types: *mut c_int,
) {
    if !types.is_null() {
        if let Some(registered) = REGISTERED_TYPES.get() {
            *types = registered.as_ptr();
        } else {
            *types = ptr::null();
        }
    }
    if !num_types.is_null() {
        *num_types = if REGISTERED_TYPES.get().is_some() {
            1
        } else {
            0
        };
    }
}

fn ensure_registered_type(module: *mut GTypeModule) -> GType {
    let existing = REGISTERED_TYPE.load(Ordering::SeqCst);
    if existing != 0 {
        return existing as GType;
    }
    let registered = unsafe { register_extension_type(module) };
    REGISTERED_TYPE.store(registered as usize, Ordering::SeqCst);
    registered
}

unsafe fn register_extension_type(module: *mut GTypeModule) -> GType {
    let Ok(type_name) = CString::new(EXTENSION_TYPE_NAME) else {
        return 0;
    };

    let mut type_info: GTypeInfo = std::mem::zeroed();
    type_info.class_size = std::mem::size_of::<GObjectClass>() as u16;
    type_info.instance_size = std::mem::size_of::<GObject>() as u16;

    let extension_type = g_type_module_register_type(
        module,
        g_object_get_type(),
        type_name.as_ptr(),
        &type_info,
        0,
    );

    let mut menu_iface: GInterfaceInfo = std::mem::zeroed();
    menu_iface.interface_init = Some(menu_provider_iface_init);

    g_type_module_add_interface(
        module,
        extension_type,
        nautilus_menu_provider_get_type(),
        &menu_iface,
    );

    extension_type
}

unsafe extern "C" fn menu_provider_iface_init(iface: gpointer, _iface_data: gpointer) {
    let iface = iface as *mut NautilusMenuProviderInterface;
    if iface.is_null() {
        return;
    }
    (*iface).get_file_items = Some(menu_provider_get_file_items);
    (*iface).get_background_items = None;
}

unsafe extern "C" fn menu_provider_get_file_items(
    _provider: *mut NautilusMenuProvider,
    files: *mut GList,
) -> *mut GList {
    let items = file_infos_to_selected_items(files);
    let Some(selection) = analyze_selection(&items) else {
        return ptr::null_mut();
    };

    let cli = odrive_cli();
    let mounts = match cli {
        Some(cli) => cli.mounts().unwrap_or_else(|err| {
            tracing::warn!("failed to list odrive mounts: {err}");
            Vec::new()
        }),
        None => Vec::new(),
    };
    let specs = build_menu(&MenuContext {
        selection: &selection,
        mounts: &mounts,
        restorable: any_restorable(&GioEmblemStore, &selection.paths),
        cli_available: cli.is_some(),
    });
    if specs.is_empty() {
        return ptr::null_mut();
    }

    let top = create_menu_item(&format!("{MENU_NAME_PREFIX}::Top"), "odrive", "odrive actions");
    if top.is_null() {
        return ptr::null_mut();
    }
    let submenu = nautilus_menu_new();
    let mut groups: Vec<(&'static str, *mut NautilusMenu)> = Vec::new();
    for spec in &specs {
        let item = create_menu_item(
            &format!("{MENU_NAME_PREFIX}::{}", spec.id),
            spec.label,
            "odrive action",
        );
        if item.is_null() {
            continue;
        }
        if !spec.sensitive {
            set_insensitive(item);
        }
        if let Some(action) = spec.action {
            attach_action_context(item, action, &spec.targets);
        }
        let parent = match spec.group {
            Some(group) => group_menu(submenu, &mut groups, group),
            None => submenu,
        };
        nautilus_menu_append_item(parent, item);
        g_object_unref(item as *mut GObject);
    }
    for (_, menu) in groups {
        g_object_unref(menu as *mut GObject);
    }
    nautilus_menu_item_set_submenu(top, submenu);
    g_object_unref(submenu as *mut GObject);

    g_list_append(ptr::null_mut(), top as gpointer)
}

/// Returns the nested menu for `group`, appending its entry to `parent` on first use.
unsafe fn group_menu(
    parent: *mut NautilusMenu,
    groups: &mut Vec<(&'static str, *mut NautilusMenu)>,
    group: &'static str,
) -> *mut NautilusMenu {
    if let Some((_, menu)) = groups.iter().find(|(label, _)| *label == group) {
        return *menu;
    }
    let item = create_menu_item(&format!("{MENU_NAME_PREFIX}::Group::{group}"), group, group);
    if item.is_null() {
        return parent;
    }
    let menu = nautilus_menu_new();
    nautilus_menu_item_set_submenu(item, menu);
    nautilus_menu_append_item(parent, item);
    g_object_unref(item as *mut GObject);
    groups.push((group, menu));
    menu
}

fn create_menu_item(name: &str, label: &str, tip: &str) -> *mut NautilusMenuItem {
    let Ok(name) = CString::new(name) else {
        return ptr::null_mut();
    };
    let Ok(label) = CString::new(label) else {
        return ptr::null_mut();
    };
    let Ok(tip) = CString::new(tip) else {
        return ptr::null_mut();
    };
    unsafe { nautilus_menu_item_new(name.as_ptr(), label.as_ptr(), tip.as_ptr(), ptr::null()) }
}

fn set_insensitive(item: *mut NautilusMenuItem) {
    unsafe {
        g_object_set(
            item as *mut GObject,
            c"sensitive".as_ptr(),
            GFALSE,
            ptr::null::<c_char>(),
        );
    }
}

fn attach_action_context(item: *mut NautilusMenuItem, action: MenuAction, targets: &[PathBuf]) {
    if item.is_null() {
        return;
    }

    if let Ok(mut contexts) = action_contexts().lock() {
        if contexts.len() > 8192 {
            contexts.clear();
        }
        contexts.insert(
            item as usize,
            ActionContext {
                action,
                targets: targets.to_vec(),
            },
        );
    }

    #[allow(clippy::missing_transmute_annotations)]
    let callback = Some(unsafe {
        std::mem::transmute::<
            unsafe extern "C" fn(*mut NautilusMenuItem, gpointer),
            unsafe extern "C" fn(),
        >(menu_item_activate_cb)
    });

    unsafe {
        g_signal_connect_data(
            item as *mut GObject,
            c"activate".as_ptr(),
            callback,
            ptr::null_mut(),
            None,
            0,
        );
    }
}

unsafe extern "C" fn menu_item_activate_cb(item: *mut NautilusMenuItem, _user_data: gpointer) {
    let context = {
        let Ok(contexts) = action_contexts().lock() else {
            tracing::error!("action context lock failed");
            return;
        };
        contexts.get(&(item as usize)).cloned()
    };
    let Some(context) = context else {
        tracing::warn!("action context not found");
        return;
    };
    let Some(cli) = odrive_cli() else {
        show_dialog(&DialogContent {
            title: context.action.title().to_string(),
            body: UNAVAILABLE_LABEL.to_string(),
        });
        return;
    };

    let dialog = perform_action(
        cli,
        &GioEmblemStore,
        settings(),
        context.action,
        &context.targets,
    );
    for path in &context.targets {
        invalidate_file_info_for_local_path(path);
        invalidate_parent_info_for_local_path(path);
    }
    if let Some(dialog) = dialog {
        show_dialog(&dialog);
    }
}

fn file_infos_to_selected_items(mut files: *mut GList) -> Vec<SelectedItem> {
    let mut items = Vec::new();
    unsafe {
        while !files.is_null() {
            let file_info = (*files).data as *mut NautilusFileInfo;
            if let Some(item) = file_info_to_selected_item(file_info) {
                items.push(item);
            }
            files = (*files).next;
        }
    }
    items
}

fn file_info_to_selected_item(file_info: *mut NautilusFileInfo) -> Option<SelectedItem> {
    if file_info.is_null() {
        return None;
    }

    unsafe {
        if nautilus_file_info_is_gone(file_info) != GFALSE {
            return None;
        }
        let uri_ptr = nautilus_file_info_get_uri(file_info);
        if uri_ptr.is_null() {
            return None;
        }

        let uri = CStr::from_ptr(uri_ptr).to_string_lossy().into_owned();
        g_free(uri_ptr as gpointer);

        Some(SelectedItem {
            uri,
            is_directory: nautilus_file_info_is_directory(file_info) != GFALSE,
        })
    }
}

include!("nautilus_plugin_runtime.rs");
