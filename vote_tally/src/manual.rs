/*!

This is the long-form manual for `vote_tally` and `votetab`.

## Counting methods

### `plurality`

Also called first-past-the-post. Every ballot selects one option. The options with
the most ballots win, one seat after the other. Ballots for a candidate who
resigned are not counted.

### `spsv`

Sequential proportional score voting. Every ballot rates some of the options on an
integer scale between `minRating` and `maxRating`. Options that are not rated are
left out of the ballot: they are not considered to have the minimum rating.

Each ballot is first turned into approval ballots with the Kotze-Pereira transform:
with ratings between 0 and 5, a ballot becomes 6 approval ballots, and the one
for level `i` approves every option rated `i` or more.

Seats are then filled one at a time. An approval ballot that already approves `e`
elected candidates counts for `1 / (1 + e)`. The candidate with the largest total
takes the seat. This gives the later seats to the voters who are not yet
represented.

For example, with 6 voters rating `A` and `B` at 5 and 4 voters rating `C` at 3:

| seat | A  | B               | C  |
|------|----|-----------------|----|
| 1    | 36 | 36              | 16 |
| 2    |    | 36 / 2 = 18     | 16 |

`A` wins the first seat over `B` by identifier order, then `B` wins the second seat.

### Ties

Ties are always broken in favour of the smallest identifier (byte order). The order
in which options are declared or ballots are cast has no influence. The scores are
compared exactly.

### Resignations

When a winner of a `spsv` vote resigns, a replacement election fills the seat. The
other winners keep their seats and the ballots approving them stay discounted.
Resignations are replayed one at a time in the order they happened. A candidate
who resigned cannot be elected again.

### Ranking

The ranking orders all the options of a vote, as if there were as many seats as
options. Resignations are not taken into account for `spsv` votes. When no ballot
has been cast, the options are listed in the order they were declared.

## Input formats

The following formats are supported for ballot files:
* `json` a list of ballots
* `csv` Comma Separated Values
* `xlsx` Excel spreadsheet

### `json`

The same ballots as in the `ballots` entry of the configuration:

```text
[
  { "id": "b1", "ratingPerOption": { "alice": 5, "bob": 2 } },
  { "id": "b2", "ratingPerOption": { "carol": 4 } }
]
```

For plurality votes, every ballot has a `selectedOptionId` instead.

### `csv`

The first row is a header. For `spsv` votes, each column is an option identifier
and each cell the rating of the option. An empty cell means that the option is not
rated.

```text
id,alice,bob,carol
b1,5,2,
b2,,,4
```

For plurality votes, the first non-empty cell of the row is the selected option.

```text
id,choice
b1,alice
b2,carol
```

The `id` column is optional. See the [Configuration section](#configuration) on
controlling the first row and column.

### `xlsx`

Same layout as `csv`, in the first worksheet or the one given by
`excelWorksheetName`.

## Configuration

`votetab` reads the description of the election from a JSON file:

```text
{
  "outputSettings": { "contestName": "Moderator election", "contestDate": "2021-03-01" },
  "vote": {
    "id": "mods-2021",
    "type": "spsv",
    "seats": 2,
    "minRating": 0,
    "maxRating": 5,
    "options": [ { "id": "alice" }, { "id": "bob" }, { "id": "carol" } ],
    "resigned": [ "bob" ]
  },
  "ballotSources": [ { "provider": "csv", "filePath": "ballots.csv", "idColumnIndex": 1, "firstVoteColumnIndex": 2 } ]
}
```

- `seats` defaults to 1, `minRating` to 0, `maxRating` to 5. The rating scale
  has at most 1000 levels.
- `resigned` lists the resignations in the order they happened.
- `ballotSources` (optional): the files containing the ballots. Paths are relative
  to the configuration file. `firstVoteColumnIndex`, `firstVoteRowIndex` and
  `idColumnIndex` start at 1, as in spreadsheets.
- `ballots` (optional): ballots written directly in the configuration.

The `--input` flag replaces the ballot sources with a single file.

 */
