use cabinet_proto::{ListMode, ListOptions, Status};

/// Apply list options to matches already ordered by key
pub(crate) fn paginate<T>(items: impl IntoIterator<Item = T>, options: &ListOptions) -> Result<Vec<T>, Status> {
    if options.page_size == 0 {
        return Err(Status::invalid_argument("page_size must be positive"));
    }
    let items = items.into_iter();
    Ok(match options.mode {
        ListMode::All => items.collect(),
        ListMode::Page(page) => {
            let size = options.page_size as usize;
            items.skip(page as usize * size).take(size).collect()
        }
    })
}
