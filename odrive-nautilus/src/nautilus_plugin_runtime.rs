    fn settings() -> &'static Settings {
        SETTINGS.get_or_init(Settings::from_env)
    }

    fn odrive_cli() -> Option<&'static OdriveCli> {
        CLI.get_or_init(|| OdriveCli::locate(settings())).as_ref()
    }

    fn action_contexts() -> &'static Mutex<HashMap<usize, ActionContext>> {
        ACTION_CONTEXTS.get_or_init(|| Mutex::new(HashMap::new()))
    }

    fn init_logging() {
        let filter = tracing_subscriber::EnvFilter::try_new(&settings().log_filter)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    // The host initialized GTK before loading extensions; gtk-rs needs to be told.
    fn mark_gtk_initialized() {
        unsafe {
            if gtk4::ffi::gtk_is_initialized() != GFALSE && !gtk4::is_initialized_main_thread() {
                gtk4::set_initialized();
            }
        }
    }

    fn show_dialog(content: &DialogContent) {
        if !gtk4::is_initialized_main_thread() {
            tracing::warn!(title = %content.title, "GTK unavailable, dialog dropped: {}", content.body);
            return;
        }
        let parent = gtk4::Window::list_toplevels()
            .into_iter()
            .filter_map(|widget| widget.downcast::<gtk4::Window>().ok())
            .find(|window| window.is_active());
        let dialog = gtk4::AlertDialog::builder()
            .modal(true)
            .message(content.title.as_str())
            .detail(content.body.as_str())
            .build();
        dialog.show(parent.as_ref());
    }

    struct GioEmblemStore;

    impl GioEmblemStore {
        fn metadata_error(path: &Path, err: gio::glib::Error) -> ExtensionError {
            ExtensionError::Metadata {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        }

        // Setting the INVALID type is how GVfs metadata attributes get removed.
        fn unset_attribute(path: &Path, attribute: &str) -> Result<(), ExtensionError> {
            use gio::glib::translate::{ToGlibPtr, from_glib_full};

            let file = gio::File::for_path(path);
            let Ok(attribute) = CString::new(attribute) else {
                return Ok(());
            };
            let mut error = ptr::null_mut();
            let ok = unsafe {
                gio::ffi::g_file_set_attribute(
                    file.to_glib_none().0,
                    attribute.as_ptr(),
                    gio::ffi::G_FILE_ATTRIBUTE_TYPE_INVALID,
                    ptr::null_mut(),
                    gio::ffi::G_FILE_QUERY_INFO_NONE,
                    ptr::null_mut(),
                    &mut error,
                )
            };
            if ok == GFALSE {
                let err: gio::glib::Error = unsafe { from_glib_full(error) };
                return Err(Self::metadata_error(path, err));
            }
            Ok(())
        }
    }

    impl EmblemStore for GioEmblemStore {
        fn emblems(&self, path: &Path) -> Result<Vec<String>, ExtensionError> {
            let file = gio::File::for_path(path);
            let info = file
                .query_info(
                    EMBLEMS_ATTRIBUTE,
                    gio::FileQueryInfoFlags::NONE,
                    gio::Cancellable::NONE,
                )
                .map_err(|err| Self::metadata_error(path, err))?;
            Ok(info
                .attribute_stringv(EMBLEMS_ATTRIBUTE)
                .into_iter()
                .map(|emblem| emblem.to_string())
                .collect())
        }

        fn set_emblem(&self, path: &Path, emblem: &str) -> Result<(), ExtensionError> {
            let file = gio::File::for_path(path);
            let info = file
                .query_info(
                    EMBLEMS_ATTRIBUTE,
                    gio::FileQueryInfoFlags::NONE,
                    gio::Cancellable::NONE,
                )
                .map_err(|err| Self::metadata_error(path, err))?;
            info.set_attribute_stringv(EMBLEMS_ATTRIBUTE, [emblem]);
            file.set_attributes_from_info(
                &info,
                gio::FileQueryInfoFlags::NONE,
                gio::Cancellable::NONE,
            )
            .map_err(|err| Self::metadata_error(path, err))
        }

        fn clear_emblems(&self, path: &Path) -> Result<(), ExtensionError> {
            Self::unset_attribute(path, EMBLEMS_ATTRIBUTE)
        }

        fn has_custom_icon(&self, path: &Path) -> Result<bool, ExtensionError> {
            let info = gio::File::for_path(path)
                .query_info(
                    &format!("{CUSTOM_ICON_ATTRIBUTE},{CUSTOM_ICON_NAME_ATTRIBUTE}"),
                    gio::FileQueryInfoFlags::NONE,
                    gio::Cancellable::NONE,
                )
                .map_err(|err| Self::metadata_error(path, err))?;
            Ok(info.has_attribute(CUSTOM_ICON_ATTRIBUTE)
                || info.has_attribute(CUSTOM_ICON_NAME_ATTRIBUTE))
        }

        fn clear_custom_icon(&self, path: &Path) -> Result<(), ExtensionError> {
            Self::unset_attribute(path, CUSTOM_ICON_ATTRIBUTE)?;
            Self::unset_attribute(path, CUSTOM_ICON_NAME_ATTRIBUTE)
        }

        fn touch(&self, path: &Path) -> Result<(), ExtensionError> {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default();
            gio::File::for_path(path)
                .set_attribute_uint64(
                    MODIFIED_TIME_ATTRIBUTE,
                    now,
                    gio::FileQueryInfoFlags::NONE,
                    gio::Cancellable::NONE,
                )
                .map_err(|err| Self::metadata_error(path, err))
        }
    }

    fn invalidate_file_info_for_local_path(local_path: &Path) {
        let Ok(uri) = url::Url::from_file_path(local_path) else {
            return;
        };
        let Ok(uri_c) = CString::new(uri.as_str()) else {
            return;
        };

        unsafe {
            let file_info = nautilus_file_info_lookup_for_uri(uri_c.as_ptr());
            if file_info.is_null() {
                return;
            }
            nautilus_file_info_invalidate_extension_info(file_info);
            g_object_unref(file_info as *mut GObject);
        }
    }

    fn invalidate_parent_info_for_local_path(local_path: &Path) {
        let Some(parent) = local_path.parent() else {
            return;
        };
        invalidate_file_info_for_local_path(parent);
    }
