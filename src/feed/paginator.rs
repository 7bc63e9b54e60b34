/// Which page a request asked for, after normalising the raw `page` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRequest {
    /// No page parameter (or an empty one).
    First,
    Number(u64),
    /// Anything unusable: non-numeric, zero or negative.
    Last,
}

impl PageRequest {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => PageRequest::First,
            Some(value) => match value.parse::<u64>() {
                Ok(n) if n >= 1 => PageRequest::Number(n),
                _ => PageRequest::Last,
            },
        }
    }
}

/// Offset/limit for a concrete page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub number: u64,
    pub num_pages: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
}

impl Paginator {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: u64::from(per_page.max(1)),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// An empty collection still has one (empty) page. Requests past the end
    /// land on the last page instead of failing.
    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page).max(1)
    }

    pub fn window(&self, total: u64, request: PageRequest) -> Window {
        let num_pages = self.num_pages(total);
        let number = match request {
            PageRequest::First => 1,
            PageRequest::Number(n) if n <= num_pages => n,
            PageRequest::Number(_) | PageRequest::Last => num_pages,
        };
        Window {
            number,
            num_pages,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    pub number: u64,
    pub current: bool,
}

/// One page of a feed plus the metadata templates need for navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: Window, total: u64) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total,
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            number: 1,
            num_pages: 1,
            total: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn previous_page_number(&self) -> u64 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> u64 {
        (self.number + 1).min(self.num_pages)
    }

    /// Every page number, flagging the one being shown.
    pub fn links(&self) -> Vec<PageLink> {
        (1..=self.num_pages)
            .map(|number| PageLink {
                number,
                current: number == self.number,
            })
            .collect()
    }
}
