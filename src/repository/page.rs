use std::str::FromStr;

use strum::{Display, EnumString};

use crate::error::RepoError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Whitelisted sort keys for employees. Names match the JSON members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EmployeeSortField {
    #[default]
    Empno,
    Ename,
    Job,
    Hiredate,
    Sal,
    Comm,
}

impl EmployeeSortField {
    pub fn column(self) -> &'static str {
        match self {
            EmployeeSortField::Empno => "empno",
            EmployeeSortField::Ename => "ename",
            EmployeeSortField::Job => "job",
            EmployeeSortField::Hiredate => "hiredate",
            EmployeeSortField::Sal => "sal",
            EmployeeSortField::Comm => "comm",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DepartmentSortField {
    #[default]
    Id,
    Name,
    Description,
}

impl DepartmentSortField {
    pub fn column(self) -> &'static str {
        match self {
            DepartmentSortField::Id => "id",
            DepartmentSortField::Name => "name",
            DepartmentSortField::Description => "description",
        }
    }
}

/// `field[,direction]`, e.g. `empno,desc`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub direction: Direction,
}

impl<F: FromStr> FromStr for Sort<F> {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let field = name
            .parse::<F>()
            .map_err(|_| RepoError::Invalid(format!("Unknown sort property '{name}'")))?;
        let direction = match parts.next() {
            None | Some("") => Direction::Asc,
            Some(d) => d
                .parse()
                .map_err(|_| RepoError::Invalid(format!("Unknown sort direction '{d}'")))?,
        };
        if parts.next().is_some() {
            return Err(RepoError::Invalid(format!("Malformed sort '{s}'")));
        }
        Ok(Sort { field, direction })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<F> {
    /// zero-based
    pub page: u32,
    pub size: u32,
    pub sort: Sort<F>,
}

impl<F> PageRequest<F> {
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Cuts one page out of an already filtered and ordered sequence.
    pub fn slice<F>(all: Vec<T>, request: &PageRequest<F>) -> Self {
        let total_elements = all.len() as u64;
        let content = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.size as usize)
            .collect();
        Page {
            content,
            number: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 1;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        u64::from(self.number) + 1 >= self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        })
    }
}
